pub mod codegen;
pub mod compat;
pub mod error;
pub mod installer;
pub mod orchestrator;

pub use error::InstallerError;
pub use installer::{Invocation, ModuleInstaller, ProcessRunner, ProcessStatus, SystemRunner};
pub use orchestrator::{InstallOrchestrator, Phase, RunReport};
