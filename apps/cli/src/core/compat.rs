use crate::core::error::InstallerError;
use module_manifest::{coerce_version, ApiRange, ManifestError, PackageQuery, ProjectLayout};
use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Incompatible,
}

/// Verdict for one installed module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    pub module: String,
    /// The module's declared requirement on the API package, if any.
    pub declared: Option<String>,
    pub compatibility: Compatibility,
}

impl CompatibilityResult {
    pub fn is_compatible(&self) -> bool {
        self.compatibility == Compatibility::Compatible
    }
}

/// True when the module declares an API range and `host` satisfies it.
/// Modules without a declaration, or with a declaration that is not a
/// version range, are never compatible.
pub fn is_compatible(host: &Version, module_api_version: Option<&str>) -> bool {
    let Some(declared) = module_api_version else {
        return false;
    };
    match ApiRange::parse(declared) {
        Some(range) => range.matches(host),
        None => {
            tracing::warn!(declared, "Unrecognised API version range");
            false
        }
    }
}

/// Works out the host's module API version.
///
/// Precedence: an explicit override, then the `version` of the installed API
/// package, then the lowest version allowed by the host manifest's own
/// declaration.
pub fn host_api_version(
    layout: &ProjectLayout,
    api_package: &str,
    override_version: Option<&str>,
    host_manifest_text: &str,
) -> Result<Version, InstallerError> {
    if let Some(raw) = override_version {
        return coerce_version(raw)
            .ok_or_else(|| InstallerError::HostApiVersion(format!("'{}' is not a version", raw)));
    }

    let installed_path = layout.installed_manifest_path(api_package);
    if installed_path.exists() {
        let installed = PackageQuery::load(&installed_path)?;
        if let Some(version) = installed.version().and_then(|v| Version::parse(v).ok()) {
            tracing::debug!(%version, "Host API version from installed {}", api_package);
            return Ok(version);
        }
    }

    let host = PackageQuery::parse(module_manifest::layout::MANIFEST_FILE, host_manifest_text)?;
    let declared = host.resolved_version(api_package)?.ok_or_else(|| {
        InstallerError::HostApiVersion(format!("package.json does not depend on '{}'", api_package))
    })?;
    let version = coerce_version(&declared).ok_or_else(|| {
        InstallerError::HostApiVersion(format!(
            "'{}' declared for '{}' is not a version range",
            declared, api_package
        ))
    })?;
    tracing::debug!(%version, declared = %declared, "Host API version from package.json");
    Ok(version)
}

/// Checks installed modules against the host's module API version.
pub struct CompatibilityChecker<'a> {
    layout: &'a ProjectLayout,
    api_package: &'a str,
    host_version: &'a Version,
}

impl<'a> CompatibilityChecker<'a> {
    pub fn new(layout: &'a ProjectLayout, api_package: &'a str, host_version: &'a Version) -> Self {
        Self {
            layout,
            api_package,
            host_version,
        }
    }

    /// The API version range declared by the installed module's own
    /// manifest. A module whose manifest is missing declares nothing.
    pub fn api_version_of(&self, module: &str) -> Result<Option<String>, InstallerError> {
        let path = self.layout.installed_manifest_path(module);
        let query = match PackageQuery::load(&path) {
            Ok(query) => query,
            Err(ManifestError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::warn!(module, path = %path.display(), "Installed manifest not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(query.resolved_version(self.api_package)?)
    }

    pub fn check(&self, module: &str) -> Result<CompatibilityResult, InstallerError> {
        let declared = self.api_version_of(module)?;
        let compatibility = if is_compatible(self.host_version, declared.as_deref()) {
            Compatibility::Compatible
        } else {
            Compatibility::Incompatible
        };

        tracing::info!(
            module,
            declared = declared.as_deref().unwrap_or("<none>"),
            host = %self.host_version,
            "{:?}",
            compatibility
        );

        Ok(CompatibilityResult {
            module: module.to_string(),
            declared,
            compatibility,
        })
    }

    /// Checks every module; does not stop at the first incompatible one.
    pub fn check_all(&self, modules: &[String]) -> Result<Vec<CompatibilityResult>, InstallerError> {
        modules.iter().map(|m| self.check(m)).collect()
    }
}
