use anyhow::{Context, Result};
use clap::Parser;
use module_installer::config::{find_and_load_config, load_config, InstallerConfig};
use module_installer::core::error::EXIT_FATAL;
use module_installer::core::SystemRunner;
use module_installer::ui::{self, Theme};
use module_installer::InstallOrchestrator;
use module_manifest::PackageManager;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "module-installer", version)]
#[command(
    about = "Install optional modules, check their API compatibility and generate their registration file",
    long_about = None
)]
struct Cli {
    /// Project root containing package.json (defaults to current directory)
    #[arg(long, short = 'C')]
    project_root: Option<PathBuf>,

    /// Config file (defaults to modules.json/.toml/.yaml in the project root)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Additional module reference, installed after configured ones
    #[arg(long = "module", short = 'm', value_name = "REF")]
    modules: Vec<String>,

    /// Package manager used to install modules
    #[arg(long)]
    package_manager: Option<PackageManager>,

    /// Name of the host's module API package
    #[arg(long)]
    api_package: Option<String>,

    /// Host module API version, instead of reading it from the project
    #[arg(long)]
    api_version: Option<String>,

    /// Generated registration file, relative to the project root
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    quiet: bool,
}

impl Cli {
    fn project_root(&self) -> PathBuf {
        self.project_root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Config file values with command-line overrides applied.
    fn resolve_config(&self, root: &std::path::Path) -> Result<InstallerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(&root.join(path))?,
            None => match find_and_load_config(root)? {
                Some((path, config)) => {
                    tracing::info!(path = %path.display(), "Loaded config");
                    config
                }
                None => {
                    tracing::debug!("No config file found, using defaults");
                    InstallerConfig::default()
                }
            },
        };

        config.modules.extend(self.modules.iter().cloned());
        if let Some(pm) = self.package_manager {
            config.package_manager = pm;
        }
        if let Some(api_package) = &self.api_package {
            config.api_package = api_package.clone();
        }
        if let Some(api_version) = &self.api_version {
            config.api_version = Some(api_version.clone());
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let default = match (verbose, quiet) {
        (true, _) => "module_installer=debug,module_manifest=debug",
        (_, true) => "module_installer=warn,module_manifest=warn",
        _ => "module_installer=info,module_manifest=info",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to initialise logging")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("{:#}", e);
    }

    let root = cli.project_root();
    let config = match cli.resolve_config(&root) {
        Ok(config) => config,
        Err(e) => {
            ui::error(format!("{:#}", e));
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let configured = config.modules.len();
    let orchestrator = InstallOrchestrator::new(config, &root, SystemRunner);

    match orchestrator.run() {
        Ok(report) if report.modules.is_empty() => {
            if configured > 0 {
                ui::warn(format!(
                    "{} module reference(s) added no new optional dependencies",
                    configured
                ));
            }
            ui::success(format!(
                "No modules to register; wrote empty registration to {}",
                Theme::muted(report.output.display())
            ));
            ExitCode::SUCCESS
        }
        Ok(report) => {
            ui::info(format!("Installed {} module(s):", report.modules.len()));
            for module in &report.modules {
                ui::item(Theme::secondary(module));
            }
            ui::success(format!(
                "Module registration written to {}",
                Theme::muted(report.output.display())
            ));
            ExitCode::SUCCESS
        }
        Err(e) => {
            e.render();
            ExitCode::from(e.exit_code())
        }
    }
}
