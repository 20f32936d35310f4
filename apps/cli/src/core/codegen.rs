//! Emits the JavaScript module that statically registers installed modules.
//!
//! Output is a pure function of the ordered module list, so the same input
//! always yields the same bytes.

use crate::core::error::InstallerError;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str =
    "// This file is generated by module-installer. Do not edit it by hand.\n";
pub const REGISTRY_NAME: &str = "modules";

/// One generated import: `import <alias> from "<module>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub alias: String,
    pub module: String,
}

/// Ordered registrations. Aliases are `Module1`, `Module2`, ... by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedRegistration {
    entries: Vec<Registration>,
}

impl GeneratedRegistration {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = modules
            .into_iter()
            .enumerate()
            .map(|(i, module)| Registration {
                alias: format!("Module{}", i + 1),
                module: module.into(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[Registration] {
        &self.entries
    }

    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);

        if !self.entries.is_empty() {
            out.push('\n');
            for entry in &self.entries {
                let _ = writeln!(
                    out,
                    "import {} from {};",
                    entry.alias,
                    js_string(&entry.module)
                );
            }
        }

        let _ = writeln!(out, "\nexport const {} = [];", REGISTRY_NAME);

        if !self.entries.is_empty() {
            out.push('\n');
            for entry in &self.entries {
                let _ = writeln!(out, "{}.push({});", REGISTRY_NAME, entry.alias);
            }
        }

        out
    }
}

/// File content for a project with no modules configured.
pub fn empty_registration() -> String {
    GeneratedRegistration::default().render()
}

/// File content registering `modules` in the given order.
pub fn render(modules: &[String]) -> String {
    GeneratedRegistration::new(modules.iter().cloned()).render()
}

/// Registration text written next to its destination but not yet moved into
/// place. Dropping it without [`commit`](Self::commit) removes the staged
/// file and leaves any existing registration untouched.
#[must_use = "a staged registration is discarded unless committed"]
#[derive(Debug)]
pub struct StagedRegistration {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedRegistration {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Renames the staged file over the destination.
    pub fn commit(mut self) -> Result<(), InstallerError> {
        fs::rename(&self.staging, &self.target).map_err(|source| InstallerError::Io {
            path: self.target.clone(),
            source,
        })?;
        self.committed = true;
        tracing::debug!(path = %self.target.display(), "Registration file written");
        Ok(())
    }
}

impl Drop for StagedRegistration {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.staging);
        }
    }
}

/// Writes `contents` to `<path>.tmp`, creating parent directories as needed.
pub fn stage_registration(path: &Path, contents: &str) -> Result<StagedRegistration, InstallerError> {
    let io_err = |source: std::io::Error| InstallerError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");

    let staged = StagedRegistration {
        staging: PathBuf::from(staging),
        target: path.to_path_buf(),
        committed: false,
    };
    fs::write(&staged.staging, contents).map_err(io_err)?;
    Ok(staged)
}

/// Replaces `path` with `contents`. The text goes to a sibling temp file
/// first and is renamed into place.
pub fn write_registration(path: &Path, contents: &str) -> Result<(), InstallerError> {
    stage_registration(path, contents)?.commit()
}

/// Double-quoted JavaScript string literal. Package names pass through
/// unchanged; quotes and backslashes are escaped.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
