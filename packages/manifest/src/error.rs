use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The text is not valid JSON. `src` keeps the offending text so the
    /// caller can point at the failing line.
    #[error("Failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        src: String,
        source: serde_json::Error,
    },

    /// Valid JSON, but not shaped like a package manifest.
    #[error("Malformed {origin}: {reason}")]
    Malformed { origin: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ManifestError>;
