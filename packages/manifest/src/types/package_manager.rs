use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported JavaScript package managers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    /// Executable name looked up on `PATH`.
    pub fn program(&self) -> &'static str {
        match (self, cfg!(windows)) {
            (PackageManager::Npm, false) => "npm",
            (PackageManager::Npm, true) => "npm.cmd",
            (PackageManager::Yarn, false) => "yarn",
            (PackageManager::Yarn, true) => "yarn.cmd",
            (PackageManager::Pnpm, false) => "pnpm",
            (PackageManager::Pnpm, true) => "pnpm.cmd",
        }
    }

    /// Lockfile written next to `package.json`.
    pub fn lockfile(&self) -> &'static str {
        match self {
            PackageManager::Npm => "package-lock.json",
            PackageManager::Yarn => "yarn.lock",
            PackageManager::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// Arguments that add `reference` to `optionalDependencies`.
    pub fn add_optional_args(&self, reference: &str) -> Vec<String> {
        let args: [&str; 2] = match self {
            PackageManager::Npm => ["install", "--save-optional"],
            PackageManager::Yarn => ["add", "--optional"],
            PackageManager::Pnpm => ["add", "--save-optional"],
        };
        args.iter()
            .map(|a| a.to_string())
            .chain(std::iter::once(reference.to_string()))
            .collect()
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            "pnpm" => Ok(PackageManager::Pnpm),
            other => Err(format!(
                "unsupported package manager '{}' (expected npm, yarn or pnpm)",
                other
            )),
        }
    }
}
