//! Manifest-level building blocks for the module installer: reading and
//! restoring `package.json` plus its lockfile, querying dependency sections,
//! and npm-style version ranges.

pub mod error;
pub mod layout;
pub mod query;
pub mod snapshot;
pub mod types;

pub use error::{ManifestError, Result};
pub use layout::ProjectLayout;
pub use query::{optional_dependency_names, resolved_version, DependencyNames, PackageQuery};
pub use snapshot::{ManifestGuard, ManifestPair, ManifestSnapshot};
pub use types::*;
