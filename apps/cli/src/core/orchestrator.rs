//! The install → verify → generate run.
//!
//! The package manager is allowed to edit `package.json` and its lockfile
//! while modules are installed, but those edits only exist for the duration
//! of the run: the snapshot taken up front is always written back.

use crate::config::InstallerConfig;
use crate::core::codegen::{
    empty_registration, render, stage_registration, write_registration, StagedRegistration,
};
use crate::core::compat::{host_api_version, CompatibilityChecker};
use crate::core::error::InstallerError;
use crate::core::installer::{ModuleInstaller, ProcessRunner};
use module_manifest::layout::MANIFEST_FILE;
use module_manifest::{optional_dependency_names, ManifestGuard, ProjectLayout};
use std::fmt;
use std::path::PathBuf;

/// Run phases, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    NoModulesConfigured,
    Snapshotting,
    Installing,
    Diffing,
    Checking,
    Generating,
    Failing,
    Restoring,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Successful run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Where the registration file was written.
    pub output: PathBuf,
    /// Registered modules in alias order. Empty when none were configured.
    pub modules: Vec<String>,
}

pub struct InstallOrchestrator<R> {
    config: InstallerConfig,
    layout: ProjectLayout,
    installer: ModuleInstaller<R>,
}

impl<R: ProcessRunner> InstallOrchestrator<R> {
    pub fn new(config: InstallerConfig, project_root: impl Into<PathBuf>, runner: R) -> Self {
        let layout = ProjectLayout::new(project_root, config.package_manager);
        let installer = ModuleInstaller::new(runner, config.package_manager, layout.root());
        Self {
            config,
            layout,
            installer,
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn output_path(&self) -> PathBuf {
        self.layout.resolve(&self.config.output)
    }

    pub fn run(&self) -> Result<RunReport, InstallerError> {
        enter(Phase::Start);
        let output = self.output_path();

        if self.config.modules.is_empty() {
            enter(Phase::NoModulesConfigured);
            write_registration(&output, &empty_registration())?;
            enter(Phase::Done);
            return Ok(RunReport {
                output,
                modules: Vec::new(),
            });
        }

        self.config.validate()?;

        enter(Phase::Snapshotting);
        let guard = self.layout.snapshot().acquire()?;

        let outcome = self.install_and_register(&guard, &output);

        enter(Phase::Restoring);
        let restored = guard.release();

        // The registration only replaces the output once the project is back
        // in its original state; a dropped staging file is removed.
        let result = match (outcome, restored) {
            (Ok((modules, staged)), Ok(())) => staged
                .commit()
                .map(|()| RunReport { output, modules }),
            (Ok(_), Err(restore_err)) => Err(restore_err.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore_err)) => {
                tracing::error!("Manifest restore failed after an earlier error: {}", restore_err);
                Err(e)
            }
        };

        enter(if result.is_ok() { Phase::Done } else { Phase::Failed });
        result
    }

    /// Everything between snapshot and restore. Any error returned here
    /// still leads to the snapshot being restored by the caller, and the
    /// staged registration is committed only after that restore.
    fn install_and_register(
        &self,
        guard: &ManifestGuard,
        output: &std::path::Path,
    ) -> Result<(Vec<String>, StagedRegistration), InstallerError> {
        let original = &guard.pair().manifest_text;
        let before = optional_dependency_names(MANIFEST_FILE, original)?;
        let host_version = host_api_version(
            &self.layout,
            &self.config.api_package,
            self.config.api_version.as_deref(),
            original,
        )?;
        tracing::info!(
            host_api = %host_version,
            existing = before.len(),
            "Snapshot taken"
        );

        enter(Phase::Installing);
        self.installer.install_all(&self.config.modules)?;

        enter(Phase::Diffing);
        let current = guard.snapshot().read_manifest()?;
        let after = optional_dependency_names(MANIFEST_FILE, &current)?;
        let installed = after.newly_added(&before);
        if installed.is_empty() {
            tracing::warn!("No new optional dependencies appeared in {}", MANIFEST_FILE);
        } else {
            tracing::info!(modules = ?installed, "Newly installed modules");
        }

        enter(Phase::Checking);
        let checker =
            CompatibilityChecker::new(&self.layout, &self.config.api_package, &host_version);
        let incompatible: Vec<String> = checker
            .check_all(&installed)?
            .into_iter()
            .filter(|r| !r.is_compatible())
            .map(|r| r.module)
            .collect();

        if !incompatible.is_empty() {
            enter(Phase::Failing);
            tracing::error!(modules = ?incompatible, "Incompatible modules, registration not written");
            return Err(InstallerError::Incompatible {
                modules: incompatible,
            });
        }

        enter(Phase::Generating);
        let staged = stage_registration(output, &render(&installed))?;
        Ok((installed, staged))
    }
}

fn enter(phase: Phase) {
    tracing::debug!(%phase, "Entering phase");
}
