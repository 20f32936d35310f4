pub mod package_manager;
pub mod version;

pub use package_manager::PackageManager;
pub use version::{coerce_version, ApiRange};
