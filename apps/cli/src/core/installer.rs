use crate::core::error::InstallerError;
use module_manifest::PackageManager;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Exit status of a finished subprocess. `code` is `None` when the process
/// was terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    code: Option<i32>,
}

impl ProcessStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn signalled() -> Self {
        Self { code: None }
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ProcessStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// A single subprocess request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Connect the child's stdin/stdout/stderr to ours.
    pub passthrough: bool,
}

/// Capability to run a subprocess and wait for it.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessStatus>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessStatus> {
        (**self).run(invocation)
    }
}

/// Runs real processes, inheriting the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessStatus> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&invocation.cwd);

        if invocation.passthrough {
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        command.status().map(ProcessStatus::from)
    }
}

/// Adds module references as optional dependencies, one package manager
/// call per reference.
pub struct ModuleInstaller<R> {
    runner: R,
    package_manager: PackageManager,
    project_root: PathBuf,
}

impl<R: ProcessRunner> ModuleInstaller<R> {
    pub fn new(runner: R, package_manager: PackageManager, project_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            package_manager,
            project_root: project_root.into(),
        }
    }

    pub fn invocation(&self, reference: &str) -> Invocation {
        Invocation {
            program: self.package_manager.program().to_string(),
            args: self.package_manager.add_optional_args(reference),
            cwd: self.project_root.clone(),
            passthrough: true,
        }
    }

    /// Blocks until the package manager exits. Non-zero exit is an error.
    pub fn install(&self, reference: &str) -> Result<(), InstallerError> {
        let invocation = self.invocation(reference);
        tracing::info!(
            "Running {} {}",
            invocation.program,
            invocation.args.join(" ")
        );

        let status = self
            .runner
            .run(&invocation)
            .map_err(|source| InstallerError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if !status.success() {
            tracing::error!(reference, %status, "Package manager failed");
            return Err(InstallerError::Install {
                reference: reference.to_string(),
                status,
            });
        }

        tracing::debug!(reference, "Installed");
        Ok(())
    }

    /// Installs every reference in order, stopping at the first failure.
    pub fn install_all(&self, references: &[String]) -> Result<(), InstallerError> {
        for reference in references {
            self.install(reference)?;
        }
        Ok(())
    }
}
