use crate::core::installer::ProcessStatus;
use module_manifest::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for a run rejected because of incompatible modules.
pub const EXIT_INCOMPATIBLE: u8 = 1;
/// Exit status for every other failure (install, I/O, parse, config).
pub const EXIT_FATAL: u8 = 2;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Installing '{reference}' failed ({status})")]
    Install {
        reference: String,
        status: ProcessStatus,
    },

    #[error("Incompatible modules: {}", modules.join(", "))]
    Incompatible { modules: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot determine the host module API version: {0}")]
    HostApiVersion(String),
}

impl InstallerError {
    pub fn exit_code(&self) -> u8 {
        match self {
            InstallerError::Incompatible { .. } => EXIT_INCOMPATIBLE,
            _ => EXIT_FATAL,
        }
    }

    /// Returns an actionable suggestion for the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            InstallerError::Manifest(ManifestError::Read { .. }) => Some(
                "Run the package manager once so that package.json and its lockfile exist."
                    .to_string(),
            ),
            InstallerError::Manifest(ManifestError::Parse { .. })
            | InstallerError::Manifest(ManifestError::Malformed { .. }) => {
                Some("Fix the manifest by hand; it was not modified by this run.".to_string())
            }
            InstallerError::Manifest(ManifestError::Write { .. }) => Some(
                "Restore package.json and the lockfile from version control.".to_string(),
            ),
            InstallerError::Spawn { program, .. } => {
                Some(format!("Make sure '{}' is installed and on PATH.", program))
            }
            InstallerError::Install { .. } => Some(
                "Check the package manager output above. package.json was restored.".to_string(),
            ),
            InstallerError::Incompatible { .. } => Some(
                "Upgrade the listed modules or pin versions built for this host's module API."
                    .to_string(),
            ),
            InstallerError::HostApiVersion(_) => Some(
                "Declare the API package in package.json or pass --api-version.".to_string(),
            ),
            InstallerError::Config(_) => {
                Some("Check modules.json (or .toml/.yaml) for empty entries.".to_string())
            }
            InstallerError::Io { .. } => None,
        }
    }

    pub fn render(&self) {
        if let InstallerError::Manifest(ManifestError::Parse { origin, src, source }) = self {
            crate::ui::diagnostic::report_manifest_parse_error(origin, src, source);
        }

        match self {
            InstallerError::Incompatible { modules } => {
                eprintln!(
                    "\n{} {} incompatible module(s):",
                    console::style("Error:").red().bold(),
                    modules.len()
                );
                for module in modules {
                    eprintln!("  {} {}", console::style("✖").red(), module);
                }
            }
            _ => eprintln!("\n{} {}", console::style("Error:").red().bold(), self),
        }

        if let Some(s) = self.suggestion() {
            eprintln!("{} {}", console::style("  help:").dim(), s);
        }
    }
}
