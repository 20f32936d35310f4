use crate::core::error::InstallerError;
use anyhow::{Context, Result};
use module_manifest::PackageManager;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_PACKAGE: &str = "module-api";
pub const DEFAULT_OUTPUT: &str = "src/modules.generated.js";

/// Discovery order inside the project root.
pub const CONFIG_CANDIDATES: [&str; 4] =
    ["modules.json", "modules.toml", "modules.yaml", "modules.yml"];

/// Build configuration: which modules to install and how.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct InstallerConfig {
    /// Module references, installed in this order.
    #[serde(default)]
    pub modules: Vec<String>,

    #[serde(default)]
    pub package_manager: PackageManager,

    /// Package whose version gates module compatibility.
    #[serde(default = "default_api_package")]
    pub api_package: String,

    /// Overrides the host API version otherwise read from the project.
    #[serde(default)]
    pub api_version: Option<String>,

    /// Generated registration file, relative to the project root.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_api_package() -> String {
    DEFAULT_API_PACKAGE.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            package_manager: PackageManager::default(),
            api_package: default_api_package(),
            api_version: None,
            output: default_output(),
        }
    }
}

impl InstallerConfig {
    /// Rejects empty module references and an empty API package name.
    pub fn validate(&self) -> Result<(), InstallerError> {
        if let Some(index) = self.modules.iter().position(|m| m.trim().is_empty()) {
            return Err(InstallerError::Config(format!(
                "module reference #{} is empty",
                index + 1
            )));
        }
        if self.api_package.trim().is_empty() {
            return Err(InstallerError::Config("api-package is empty".to_string()));
        }
        Ok(())
    }
}

/// Finds the first config file in `start_dir` and loads it.
pub fn find_and_load_config(start_dir: &Path) -> Result<Option<(PathBuf, InstallerConfig)>> {
    for filename in CONFIG_CANDIDATES {
        let path = start_dir.join(filename);
        if path.exists() {
            return load_config(&path).map(|c| Some((path, c)));
        }
    }
    Ok(None)
}

/// Loads a config file, detecting format by extension.
pub fn load_config(path: &Path) -> Result<InstallerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    match ext {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {:?}", path)),
        "toml" => {
            toml::from_str(&content).with_context(|| format!("Failed to parse TOML config: {:?}", path))
        }
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {:?}", path)),
        _ => anyhow::bail!("Unsupported config format: {:?}", path),
    }
}
