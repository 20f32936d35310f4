use crate::error::{ManifestError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `package.json` and its lockfile, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPair {
    pub manifest_text: String,
    pub lock_text: String,
}

/// Reads and writes back the two manifest artifacts as opaque text.
#[derive(Debug, Clone)]
pub struct ManifestSnapshot {
    manifest_path: PathBuf,
    lock_path: PathBuf,
}

impl ManifestSnapshot {
    pub fn new(manifest_path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            lock_path: lock_path.into(),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Reads both files. Either one missing is an error.
    pub fn capture(&self) -> Result<ManifestPair> {
        Ok(ManifestPair {
            manifest_text: read(&self.manifest_path)?,
            lock_text: read(&self.lock_path)?,
        })
    }

    /// Current text of the manifest alone, for observing package manager
    /// changes mid-run.
    pub fn read_manifest(&self) -> Result<String> {
        read(&self.manifest_path)
    }

    /// Overwrites both files with `pair`. Both writes are attempted even if
    /// the first fails; the first error is returned.
    pub fn restore(&self, pair: &ManifestPair) -> Result<()> {
        let manifest = write(&self.manifest_path, &pair.manifest_text);
        let lock = write(&self.lock_path, &pair.lock_text);
        manifest.and(lock)
    }

    /// Captures the current state and returns a guard that puts it back.
    pub fn acquire(self) -> Result<ManifestGuard> {
        let pair = self.capture()?;
        tracing::debug!(
            manifest = %self.manifest_path.display(),
            lock = %self.lock_path.display(),
            "Captured manifest snapshot"
        );
        Ok(ManifestGuard {
            snapshot: self,
            pair,
            released: false,
        })
    }
}

/// Holds a captured [`ManifestPair`] and restores it exactly once: through
/// [`ManifestGuard::release`], or on drop if release was never called.
#[must_use = "dropping the guard restores the manifest immediately"]
#[derive(Debug)]
pub struct ManifestGuard {
    snapshot: ManifestSnapshot,
    pair: ManifestPair,
    released: bool,
}

impl ManifestGuard {
    pub fn pair(&self) -> &ManifestPair {
        &self.pair
    }

    pub fn snapshot(&self) -> &ManifestSnapshot {
        &self.snapshot
    }

    /// Restores the captured pair and reports the outcome.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        let result = self.snapshot.restore(&self.pair);
        if result.is_ok() {
            tracing::debug!("Manifest snapshot restored");
        }
        result
    }
}

impl Drop for ManifestGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.snapshot.restore(&self.pair) {
            Ok(()) => tracing::debug!("Manifest snapshot restored on drop"),
            Err(e) => tracing::error!("Failed to restore manifest snapshot: {}", e),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    })
}
