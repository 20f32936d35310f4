use crate::snapshot::ManifestSnapshot;
use crate::types::PackageManager;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";
pub const INSTALL_DIR: &str = "node_modules";

/// Well-known locations inside a JavaScript project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    package_manager: PackageManager,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, package_manager: PackageManager) -> Self {
        Self {
            root: root.into(),
            package_manager,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_manager(&self) -> PackageManager {
        self.package_manager
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(self.package_manager.lockfile())
    }

    /// `node_modules/<name>/package.json`. Scoped names (`@scope/pkg`) nest
    /// one directory deeper.
    pub fn installed_manifest_path(&self, name: &str) -> PathBuf {
        let mut path = self.root.join(INSTALL_DIR);
        for segment in name.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.join(MANIFEST_FILE)
    }

    /// Resolves a project-relative path. Absolute paths are returned as is.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn snapshot(&self) -> ManifestSnapshot {
        ManifestSnapshot::new(self.manifest_path(), self.lock_path())
    }
}
