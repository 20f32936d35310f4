//! Read-only queries over `package.json` text.
//!
//! Queries work on text. Callers hand in manifest text plus an `origin`
//! label used in error messages; [`PackageQuery::load`] is the only helper
//! that reads a file.

use crate::error::{ManifestError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

pub const DEPENDENCIES: &str = "dependencies";
pub const DEV_DEPENDENCIES: &str = "devDependencies";
pub const OPTIONAL_DEPENDENCIES: &str = "optionalDependencies";

/// Lookup precedence for [`PackageQuery::resolved_version`]. A freshly added
/// optional dependency shadows any older declaration of the same package.
const RESOLUTION_ORDER: [&str; 3] = [OPTIONAL_DEPENDENCIES, DEV_DEPENDENCIES, DEPENDENCIES];

/// Dependency names in manifest declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyNames(Vec<String>);

impl DependencyNames {
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Names present in `self` but not in `before`, keeping the order in
    /// which `self` declares them.
    pub fn newly_added(&self, before: &DependencyNames) -> Vec<String> {
        let known: HashSet<&str> = before.iter().collect();
        self.0
            .iter()
            .filter(|name| !known.contains(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl FromIterator<String> for DependencyNames {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self(names)
    }
}

/// A parsed package manifest.
#[derive(Debug, Clone)]
pub struct PackageQuery {
    origin: String,
    root: Map<String, Value>,
}

impl PackageQuery {
    /// Parses manifest text. Invalid JSON, or JSON whose top level is not an
    /// object, is an error.
    pub fn parse(origin: impl Into<String>, text: &str) -> Result<Self> {
        let origin = origin.into();
        let value: Value = serde_json::from_str(text).map_err(|source| ManifestError::Parse {
            origin: origin.clone(),
            src: text.to_string(),
            source,
        })?;

        match value {
            Value::Object(root) => Ok(Self { origin, root }),
            other => Err(ManifestError::Malformed {
                origin,
                reason: format!("expected a JSON object, found {}", kind_of(&other)),
            }),
        }
    }

    /// Reads and parses the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path.display().to_string(), &text)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Top-level `version` field, if it is a string.
    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    /// Keys of `optionalDependencies`. A missing section means none.
    pub fn optional_dependency_names(&self) -> Result<DependencyNames> {
        Ok(self
            .section(OPTIONAL_DEPENDENCIES)?
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Declared specifier of `name`, searched in optional, dev, then direct
    /// dependencies. First match wins.
    pub fn resolved_version(&self, name: &str) -> Result<Option<String>> {
        for key in RESOLUTION_ORDER {
            let Some(deps) = self.section(key)? else {
                continue;
            };
            match deps.get(name) {
                Some(Value::String(spec)) => return Ok(Some(spec.clone())),
                Some(other) => {
                    return Err(ManifestError::Malformed {
                        origin: self.origin.clone(),
                        reason: format!(
                            "{key}.{name} must be a string, found {}",
                            kind_of(other)
                        ),
                    })
                }
                None => {}
            }
        }
        Ok(None)
    }

    fn section(&self, key: &str) -> Result<Option<&Map<String, Value>>> {
        match self.root.get(key) {
            None => Ok(None),
            Some(Value::Object(deps)) => Ok(Some(deps)),
            Some(other) => Err(ManifestError::Malformed {
                origin: self.origin.clone(),
                reason: format!("{key} must be an object, found {}", kind_of(other)),
            }),
        }
    }
}

/// Optional dependency names declared by `text`.
pub fn optional_dependency_names(origin: &str, text: &str) -> Result<DependencyNames> {
    PackageQuery::parse(origin, text)?.optional_dependency_names()
}

/// Declared specifier of `name` in `text`, see [`PackageQuery::resolved_version`].
pub fn resolved_version(name: &str, origin: &str, text: &str) -> Result<Option<String>> {
    PackageQuery::parse(origin, text)?.resolved_version(name)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
