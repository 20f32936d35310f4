//! Installs optional module packages through the project's package manager,
//! checks that each one targets the host's module API, and generates a
//! source file that registers the compatible ones.

pub mod config;
pub mod core;
pub mod ui;

pub use crate::config::InstallerConfig;
pub use crate::core::{InstallOrchestrator, InstallerError, RunReport};
