use module_installer::core::codegen::{empty_registration, render};
use module_installer::core::{Invocation, ProcessRunner, ProcessStatus};
use module_installer::{InstallOrchestrator, InstallerConfig, InstallerError};
use module_manifest::ManifestError;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HOST_MANIFEST: &str = r#"{
  "name": "host-app",
  "version": "3.2.0",
  "dependencies": {
    "module-api": "^1.4.0"
  },
  "optionalDependencies": {
    "legacy-module": "^1.0.0"
  }
}
"#;

const HOST_LOCK: &str = "{\n  \"name\": \"host-app\",\n  \"lockfileVersion\": 3\n}\n";

/// A package published to the fake registry.
#[derive(Clone)]
struct Published {
    name: &'static str,
    api_range: Option<&'static str>,
}

fn module(name: &'static str, api_range: &'static str) -> Published {
    Published {
        name,
        api_range: Some(api_range),
    }
}

/// Stands in for npm: adds packages to optionalDependencies, scribbles on
/// the lockfile and unpacks a manifest into node_modules.
#[derive(Default)]
struct FakeNpm {
    registry: HashMap<&'static str, Vec<Published>>,
    failing: Vec<&'static str>,
    /// Replace the lockfile with a directory so it can no longer be restored.
    clobber_lockfile: bool,
    calls: RefCell<Vec<Invocation>>,
}

impl FakeNpm {
    fn publish(mut self, reference: &'static str, packages: Vec<Published>) -> Self {
        self.registry.insert(reference, packages);
        self
    }

    fn fail_on(mut self, reference: &'static str) -> Self {
        self.failing.push(reference);
        self
    }

    fn clobber_lockfile(mut self) -> Self {
        self.clobber_lockfile = true;
        self
    }

    fn write_lock(&self, root: &Path, contents: String) -> io::Result<()> {
        let lock = root.join("package-lock.json");
        if self.clobber_lockfile {
            if lock.is_file() {
                fs::remove_file(&lock)?;
            }
            return fs::create_dir_all(&lock);
        }
        fs::write(lock, contents)
    }

    fn references(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.args.last().cloned())
            .collect()
    }
}

impl ProcessRunner for FakeNpm {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessStatus> {
        self.calls.borrow_mut().push(invocation.clone());
        let root = &invocation.cwd;
        let reference = invocation.args.last().cloned().unwrap_or_default();

        // npm touches the lockfile even when the install fails.
        self.write_lock(root, format!("partial {}", reference))?;

        if self.failing.iter().any(|f| *f == reference) {
            return Ok(ProcessStatus::from_code(1));
        }

        let packages = self.registry.get(reference.as_str()).cloned().unwrap_or_default();

        let manifest_path = root.join("package.json");
        let mut manifest: Value = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
        let root_obj = manifest.as_object_mut().expect("manifest is an object");
        let optional = root_obj
            .entry("optionalDependencies")
            .or_insert_with(|| Value::Object(Default::default()))
            .as_object_mut()
            .expect("optionalDependencies is an object");

        for package in &packages {
            optional.insert(package.name.to_string(), Value::from("^1.0.0"));

            let dir = package
                .name
                .split('/')
                .fold(root.join("node_modules"), |dir, segment| dir.join(segment));
            fs::create_dir_all(&dir)?;
            let mut installed = serde_json::json!({ "name": package.name, "version": "1.0.0" });
            if let Some(range) = package.api_range {
                installed["peerDependencies"] = serde_json::json!({});
                installed["dependencies"] = serde_json::json!({ "module-api": range });
            }
            fs::write(dir.join("package.json"), installed.to_string())?;
        }

        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
        self.write_lock(root, format!("resolved {}", reference))?;
        Ok(ProcessStatus::from_code(0))
    }
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), HOST_MANIFEST).unwrap();
        fs::write(dir.path().join("package-lock.json"), HOST_LOCK).unwrap();
        Self { dir }
    }

    fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn output(&self) -> PathBuf {
        self.root().join("src").join("modules.generated.js")
    }

    fn manifest(&self) -> String {
        fs::read_to_string(self.root().join("package.json")).unwrap()
    }

    fn lock(&self) -> String {
        fs::read_to_string(self.root().join("package-lock.json")).unwrap()
    }

    fn assert_manifest_untouched(&self) {
        assert_eq!(self.manifest(), HOST_MANIFEST);
        assert_eq!(self.lock(), HOST_LOCK);
    }
}

fn config(modules: &[&str]) -> InstallerConfig {
    InstallerConfig {
        modules: modules.iter().map(|m| m.to_string()).collect(),
        ..InstallerConfig::default()
    }
}

#[test]
fn test_no_modules_writes_empty_registration_without_snapshot() {
    // No package.json at all: the empty path must not try to read it.
    let project = Project::empty();
    let npm = FakeNpm::default();

    let report = InstallOrchestrator::new(config(&[]), project.root(), &npm)
        .run()
        .unwrap();

    assert!(report.modules.is_empty());
    assert_eq!(fs::read_to_string(project.output()).unwrap(), empty_registration());
    assert!(npm.references().is_empty());
    assert!(!project.root().join("package.json").exists());
}

#[test]
fn test_success_registers_modules_and_restores_manifest() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("charts", vec![module("charts", "^1.2.0")])
        .publish("@acme/maps@2", vec![module("@acme/maps", ">=1.0.0 <2.0.0")]);

    let report = InstallOrchestrator::new(config(&["charts", "@acme/maps@2"]), project.root(), &npm)
        .run()
        .unwrap();

    assert_eq!(report.modules, vec!["charts", "@acme/maps"]);
    assert_eq!(report.output, project.output());
    assert_eq!(
        fs::read_to_string(project.output()).unwrap(),
        render(&["charts".to_string(), "@acme/maps".to_string()])
    );
    assert_eq!(npm.references(), vec!["charts", "@acme/maps@2"]);
    project.assert_manifest_untouched();
}

#[test]
fn test_aliases_follow_install_order() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("zeta", vec![module("zeta", "^1.0.0")])
        .publish("alpha", vec![module("alpha", "^1.0.0")])
        .publish("mid", vec![module("mid", "^1.4.0")]);

    InstallOrchestrator::new(config(&["zeta", "alpha", "mid"]), project.root(), &npm)
        .run()
        .unwrap();

    let generated = fs::read_to_string(project.output()).unwrap();
    assert!(generated.contains("import Module1 from \"zeta\";"));
    assert!(generated.contains("import Module2 from \"alpha\";"));
    assert!(generated.contains("import Module3 from \"mid\";"));

    let pushes: Vec<&str> = generated
        .lines()
        .filter(|l| l.starts_with("modules.push("))
        .collect();
    assert_eq!(
        pushes,
        vec!["modules.push(Module1);", "modules.push(Module2);", "modules.push(Module3);"]
    );
}

#[test]
fn test_incompatible_module_is_reported_and_nothing_written() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("charts", vec![module("charts", "^1.0.0")])
        .publish("old-maps", vec![module("old-maps", "^0.9.0")]);

    let err = InstallOrchestrator::new(config(&["charts", "old-maps"]), project.root(), &npm)
        .run()
        .unwrap_err();

    match &err {
        InstallerError::Incompatible { modules } => assert_eq!(modules, &vec!["old-maps"]),
        other => panic!("expected Incompatible, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert!(!project.output().exists());
    project.assert_manifest_untouched();
}

#[test]
fn test_every_incompatible_module_is_collected() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("a", vec![module("a", "^2.0.0")])
        .publish(
            "b",
            vec![Published {
                name: "b",
                api_range: None,
            }],
        )
        .publish("c", vec![module("c", "^1.0.0")]);

    let err = InstallOrchestrator::new(config(&["a", "b", "c"]), project.root(), &npm)
        .run()
        .unwrap_err();

    match err {
        InstallerError::Incompatible { modules } => assert_eq!(modules, vec!["a", "b"]),
        other => panic!("expected Incompatible, got {other:?}"),
    }
}

#[test]
fn test_failed_verification_keeps_previous_output() {
    let project = Project::new();
    fs::create_dir_all(project.output().parent().unwrap()).unwrap();
    fs::write(project.output(), "// previous\n").unwrap();

    let npm = FakeNpm::default().publish(
        "undeclared",
        vec![Published {
            name: "undeclared",
            api_range: None,
        }],
    );

    let err = InstallOrchestrator::new(config(&["undeclared"]), project.root(), &npm)
        .run()
        .unwrap_err();

    assert!(matches!(err, InstallerError::Incompatible { .. }));
    assert_eq!(fs::read_to_string(project.output()).unwrap(), "// previous\n");
}

#[test]
fn test_install_failure_aborts_and_restores() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("charts", vec![module("charts", "^1.0.0")])
        .publish("tables", vec![module("tables", "^1.0.0")])
        .fail_on("broken");

    let err = InstallOrchestrator::new(
        config(&["charts", "broken", "tables"]),
        project.root(),
        &npm,
    )
    .run()
    .unwrap_err();

    match &err {
        InstallerError::Install { reference, status } => {
            assert_eq!(reference, "broken");
            assert_eq!(status.code(), Some(1));
        }
        other => panic!("expected Install, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert_eq!(npm.references(), vec!["charts", "broken"]);
    assert!(!project.output().exists());
    project.assert_manifest_untouched();
}

#[test]
fn test_runs_are_idempotent() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("charts", vec![module("charts", "^1.0.0")])
        .publish("maps", vec![module("maps", "1.x")]);
    let orchestrator = InstallOrchestrator::new(config(&["charts", "maps"]), project.root(), &npm);

    orchestrator.run().unwrap();
    let first = fs::read_to_string(project.output()).unwrap();
    project.assert_manifest_untouched();

    orchestrator.run().unwrap();
    let second = fs::read_to_string(project.output()).unwrap();
    project.assert_manifest_untouched();

    assert_eq!(first, second);
}

#[test]
fn test_one_reference_can_add_several_modules() {
    let project = Project::new();
    let npm = FakeNpm::default().publish(
        "bundle",
        vec![module("bundle-core", "^1.0.0"), module("bundle-extras", "~1.4.0")],
    );

    let report = InstallOrchestrator::new(config(&["bundle"]), project.root(), &npm)
        .run()
        .unwrap();

    assert_eq!(report.modules, vec!["bundle-core", "bundle-extras"]);
}

#[test]
fn test_preexisting_optional_dependency_is_not_a_new_module() {
    let project = Project::new();
    // Reinstalling an already-declared package adds nothing new.
    let npm = FakeNpm::default().publish("legacy-module", vec![module("legacy-module", "^9.0.0")]);

    let report = InstallOrchestrator::new(config(&["legacy-module"]), project.root(), &npm)
        .run()
        .unwrap();

    assert!(report.modules.is_empty());
    assert_eq!(fs::read_to_string(project.output()).unwrap(), empty_registration());
    project.assert_manifest_untouched();
}

#[test]
fn test_host_api_version_override() {
    let project = Project::new();
    let npm = FakeNpm::default().publish("next-gen", vec![module("next-gen", "^2.0.0")]);

    let mut cfg = config(&["next-gen"]);
    cfg.api_version = Some("2.3.0".to_string());

    let report = InstallOrchestrator::new(cfg, project.root(), &npm).run().unwrap();
    assert_eq!(report.modules, vec!["next-gen"]);
}

#[test]
fn test_malformed_manifest_is_fatal() {
    let project = Project::new();
    fs::write(project.root().join("package.json"), "{ \"name\": ").unwrap();
    let npm = FakeNpm::default().publish("charts", vec![module("charts", "^1.0.0")]);

    let err = InstallOrchestrator::new(config(&["charts"]), project.root(), &npm)
        .run()
        .unwrap_err();

    assert!(matches!(err, InstallerError::Manifest(ManifestError::Parse { .. })));
    assert!(npm.references().is_empty());
    assert_eq!(project.manifest(), "{ \"name\": ");
    assert_eq!(project.lock(), HOST_LOCK);
}

#[test]
fn test_missing_lockfile_fails_before_installing() {
    let project = Project::new();
    fs::remove_file(project.root().join("package-lock.json")).unwrap();
    let npm = FakeNpm::default().publish("charts", vec![module("charts", "^1.0.0")]);

    let err = InstallOrchestrator::new(config(&["charts"]), project.root(), &npm)
        .run()
        .unwrap_err();

    assert!(matches!(err, InstallerError::Manifest(ManifestError::Read { .. })));
    assert!(npm.references().is_empty());
    assert_eq!(project.manifest(), HOST_MANIFEST);
}

#[test]
fn test_restore_failure_fails_run_and_discards_registration() {
    let project = Project::new();
    fs::create_dir_all(project.output().parent().unwrap()).unwrap();
    fs::write(project.output(), "// previous\n").unwrap();

    let npm = FakeNpm::default()
        .publish("charts", vec![module("charts", "^1.0.0")])
        .clobber_lockfile();

    let err = InstallOrchestrator::new(config(&["charts"]), project.root(), &npm)
        .run()
        .unwrap_err();

    assert!(matches!(err, InstallerError::Manifest(ManifestError::Write { .. })));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(fs::read_to_string(project.output()).unwrap(), "// previous\n");
    assert!(!project.root().join("src").join("modules.generated.js.tmp").exists());
    // package.json is still written back even though the lockfile is not.
    assert_eq!(project.manifest(), HOST_MANIFEST);
}

#[test]
fn test_restore_failure_without_previous_output_writes_nothing() {
    let project = Project::new();
    let npm = FakeNpm::default()
        .publish("charts", vec![module("charts", "^1.0.0")])
        .clobber_lockfile();

    let result = InstallOrchestrator::new(config(&["charts"]), project.root(), &npm).run();

    assert!(result.is_err());
    assert!(!project.output().exists());
}

#[test]
fn test_restore_failure_keeps_original_error() {
    let project = Project::new();
    let npm = FakeNpm::default().fail_on("broken").clobber_lockfile();

    let err = InstallOrchestrator::new(config(&["broken"]), project.root(), &npm)
        .run()
        .unwrap_err();

    assert!(matches!(err, InstallerError::Install { ref reference, .. } if reference == "broken"));
    assert!(!project.output().exists());
}

#[test]
fn test_no_modules_succeeds_regardless_of_other_settings() {
    let project = Project::empty();
    let npm = FakeNpm::default();
    let cfg = InstallerConfig {
        api_package: String::new(),
        api_version: Some("not a version".to_string()),
        ..InstallerConfig::default()
    };

    let report = InstallOrchestrator::new(cfg, project.root(), &npm).run().unwrap();

    assert!(report.modules.is_empty());
    assert_eq!(fs::read_to_string(project.output()).unwrap(), empty_registration());
}

#[test]
fn test_empty_reference_is_a_config_error() {
    let project = Project::new();
    let npm = FakeNpm::default();

    let err = InstallOrchestrator::new(config(&["charts", ""]), project.root(), &npm)
        .run()
        .unwrap_err();

    assert!(matches!(err, InstallerError::Config(_)));
    assert!(npm.references().is_empty());
    project.assert_manifest_untouched();
}
