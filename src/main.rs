//! hydepip CLI Entry Point
//!
//! # Usage
//!
//! ```bash
//! # Create the environment from the default requirements file
//! hydepip create
//!
//! # Install packages, or a requirements file when no package is given
//! hydepip install requests pillow
//! hydepip install -f ~/requirements.txt
//!
//! # Remove a package / the whole environment
//! hydepip uninstall requests
//! hydepip destroy
//!
//! # Upgrade everything
//! hydepip rebuild
//!
//! # Make sure a module is importable, installing it if needed
//! hydepip ensure yaml
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info, warn};

use hydepip::config::{Overrides, Settings};
use hydepip::environment::{
    remove_environment, EnvPaths, EnvStatus, EnvironmentManager, PythonVersion, SystemRunner,
};
use hydepip::loader::{InstallingLoader, InterpreterLoader};
use hydepip::notify::{DesktopNotifier, LogNotifier, Notifier};

#[derive(Parser, Debug)]
#[command(name = "hydepip", version, about = "Python environment manager for HyDE")]
struct Cli {
    /// Use this environment root instead of the XDG state directory
    #[arg(long, global = true, value_name = "PATH")]
    env_root: Option<PathBuf>,

    /// Python interpreter used to create the environment
    #[arg(long, global = true, value_name = "PATH")]
    python: Option<PathBuf>,

    /// Log notifications instead of showing them on the desktop
    #[arg(long, global = true)]
    no_notify: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Create the virtual environment
    Create,

    /// Install dependencies or a single package
    Install {
        /// Packages to install
        packages: Vec<String>,

        /// The requirements file to use for installation
        #[arg(short = 'f', long = "requirements", value_name = "FILE")]
        requirements: Option<PathBuf>,
    },

    /// Uninstall a single package
    Uninstall {
        /// Package to uninstall
        package: String,
    },

    /// Destroy the virtual environment
    #[command(alias = "destory")]
    Destroy,

    /// Rebuild the virtual environment and update packages
    Rebuild,

    /// Resolve a module, installing it first if it is missing
    Ensure {
        /// Module name, also used as the package to install
        module: String,
    },

    /// Show where the environment lives and whether it is installed
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Version of the interpreter whose site-packages the environment uses.
///
/// Prefers the environment's own interpreter so an existing environment
/// keeps its layout even if the system Python moved on.
fn detect_version(root: &Path, system_python: &Path) -> Result<PythonVersion, Box<dyn std::error::Error>> {
    let env_python = root.join("bin").join("python");
    let interpreter = if env_python.exists() {
        env_python.as_path()
    } else {
        system_python
    };

    Ok(PythonVersion::detect(&SystemRunner, interpreter)?)
}

fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

fn notifier(settings: &Settings) -> Box<dyn Notifier> {
    if settings.notify {
        Box::new(DesktopNotifier::default())
    } else {
        Box::new(LogNotifier)
    }
}

/// Builds the manager for commands that need the site-packages layout.
fn open_manager(
    settings: &Settings,
) -> Result<EnvironmentManager<SystemRunner, Box<dyn Notifier>>, Box<dyn std::error::Error>> {
    let version = detect_version(&settings.env_root, &settings.python)?;
    let paths = EnvPaths::new(&settings.env_root, version);
    Ok(EnvironmentManager::new(paths, &settings.python, SystemRunner, notifier(settings)))
}

fn print_status(status: &EnvStatus, manifest: &Path) {
    let state = if status.installed {
        "installed".green()
    } else {
        "not installed".yellow()
    };
    let site_packages = status
        .site_packages
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let version = status
        .python_version
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("Environment:   {} ({})", status.root.display(), state);
    println!("Site packages: {}", site_packages);
    println!("Python:        {} ({})", version, status.interpreter.display());
    println!("Requirements:  {}", manifest.display());
}

/// Runs one subcommand. The interpreter is only consulted by commands that
/// touch site-packages.
fn execute(command: Commands, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Destroy => {
            remove_environment(&settings.env_root)?;
            success(&format!("Removed {}", settings.env_root.display()));
        }
        Commands::Status { json } => {
            let status = match detect_version(&settings.env_root, &settings.python) {
                Ok(version) => EnvironmentManager::new(
                    EnvPaths::new(&settings.env_root, version),
                    &settings.python,
                    SystemRunner,
                    LogNotifier,
                )
                .status(),
                Err(e) => {
                    warn!("Could not determine the Python version: {}", e);
                    EnvStatus::unresolved(&settings.env_root, &settings.python)
                }
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status, &settings.manifest);
            }
        }
        Commands::Uninstall { package } => {
            open_manager(settings)?.uninstall_package(&package)?;
            success(&format!("Uninstalled {}", package));
        }
        Commands::Create => {
            let manager = open_manager(settings)?;
            manager.create(Some(&settings.manifest))?;
            success(&format!("Environment ready at {}", manager.paths().root.display()));
        }
        Commands::Install {
            packages,
            requirements,
        } => {
            let manager = open_manager(settings)?;
            if packages.is_empty() {
                let manifest = requirements.unwrap_or_else(|| settings.manifest.clone());
                info!("Installing from {}", manifest.display());
                manager.install_from_manifest(&manifest)?;
                success(&format!("Installed requirements from {}", manifest.display()));
            } else {
                for package in &packages {
                    manager.install_package(package)?;
                    success(&format!("Installed {}", package));
                }
            }
        }
        Commands::Rebuild => {
            open_manager(settings)?.rebuild(Some(&settings.manifest))?;
            success("Environment rebuilt and packages updated");
        }
        Commands::Ensure { module } => {
            let manager = open_manager(settings)?;
            let paths = manager.paths().clone();
            let resolver = InterpreterLoader::new(SystemRunner, &paths, &settings.python);
            let mut loader = InstallingLoader::new(resolver, &manager, manager.notifier(), &paths);
            let location = loader.load_or_install(&module)?;
            match location.origin {
                Some(origin) => success(&format!("{} -> {}", module, origin.display())),
                None => success(&format!("{} (namespace package)", module)),
            }
        }
    }

    Ok(())
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = Settings::load(Overrides {
        env_root: cli.env_root,
        python: cli.python,
        no_notify: cli.no_notify,
        verbose: cli.verbose,
    })?;
    debug!("{:?}", settings);

    execute(command, &settings)
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
