//! Environment Lifecycle
//!
//! Creates, installs into, rebuilds and destroys the managed environment.
//! Each operation is a fixed sequence of `venv`/`pip` invocations; the
//! first one that fails aborts the operation and leaves the environment
//! as it is.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::error::EnvError;
use crate::notify::{Notifier, TITLE};

use super::manifest::Manifest;
use super::paths::{EnvPaths, PythonVersion};
use super::process::{CommandRunner, ToolCommand};

/// Snapshot of the environment for reporting.
///
/// `site_packages` and `python_version` are `None` when no interpreter
/// could be asked for its version.
#[derive(Debug, Clone, Serialize)]
pub struct EnvStatus {
    pub root: PathBuf,
    pub site_packages: Option<PathBuf>,
    pub python_version: Option<PythonVersion>,
    pub interpreter: PathBuf,
    pub installed: bool,
}

impl EnvStatus {
    /// Report for an environment whose interpreter version is unknown.
    pub fn unresolved(root: impl Into<PathBuf>, interpreter: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let installed = root.join("bin").join("pip").exists();
        Self {
            root,
            site_packages: None,
            python_version: None,
            interpreter: interpreter.into(),
            installed,
        }
    }
}

/// Deletes the environment rooted at `root`. Missing roots are left alone.
///
/// Needs no interpreter, so it works even when Python itself is broken.
pub fn remove_environment(root: &Path) -> Result<(), EnvError> {
    if !root.exists() {
        debug!("Nothing to destroy at {}", root.display());
        return Ok(());
    }

    fs::remove_dir_all(root)?;
    info!("Removed environment at {}", root.display());
    Ok(())
}

/// Manages the lifecycle of one environment.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use hydepip::environment::{EnvPaths, EnvironmentManager, PythonVersion, SystemRunner};
/// use hydepip::notify::DesktopNotifier;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let paths = EnvPaths::new("/tmp/pip_env", PythonVersion::new(3, 12));
///     let manager = EnvironmentManager::new(paths, "python3", SystemRunner, DesktopNotifier::default());
///     manager.install_package("requests")?;
///     Ok(())
/// }
/// ```
pub struct EnvironmentManager<R, N> {
    paths: EnvPaths,
    interpreter: PathBuf,
    runner: R,
    notifier: N,
}

impl<R: CommandRunner, N: Notifier> EnvironmentManager<R, N> {
    /// Creates a manager. `interpreter` is the system Python used to
    /// materialize the environment.
    pub fn new(paths: EnvPaths, interpreter: impl Into<PathBuf>, runner: R, notifier: N) -> Self {
        Self {
            paths,
            interpreter: interpreter.into(),
            runner,
            notifier,
        }
    }

    pub fn paths(&self) -> &EnvPaths {
        &self.paths
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn pip(&self) -> ToolCommand {
        ToolCommand::new(self.paths.pip())
    }

    fn upgrade_pip(&self) -> Result<(), EnvError> {
        self.runner
            .run(&self.pip().args(["install", "--upgrade", "pip"]))?;
        Ok(())
    }

    /// Creates the environment and installs the manifest into it.
    ///
    /// Does nothing if the environment's `pip` already exists.
    pub fn create(&self, manifest: Option<&Path>) -> Result<(), EnvError> {
        if self.paths.is_installed() {
            debug!("Environment already exists at {}", self.paths.root.display());
            return Ok(());
        }

        info!("Creating environment at {}", self.paths.root.display());
        let venv = ToolCommand::new(&self.interpreter)
            .args(["-m", "venv"])
            .arg(&self.paths.root);
        self.runner.run(&venv)?;
        self.upgrade_pip()?;

        if let Some(manifest) = self.load_manifest(manifest)? {
            if manifest.is_empty() {
                debug!("{} lists no packages", manifest.path().display());
            } else {
                self.notifier.notify(TITLE, &manifest.notification_body());
                self.install_requirements(manifest.path(), false)?;
            }
        }

        info!("Environment created at {}", self.paths.root.display());
        self.notifier
            .notify(TITLE, "✅ Virtual environment created successfully");
        Ok(())
    }

    /// Deletes the environment. Missing environments are left alone.
    pub fn destroy(&self) -> Result<(), EnvError> {
        remove_environment(&self.paths.root)
    }

    /// Installs every package listed in `manifest`, creating the
    /// environment first if needed.
    pub fn install_from_manifest(&self, manifest: &Path) -> Result<(), EnvError> {
        if !self.paths.is_installed() {
            return self.create(Some(manifest));
        }

        if !manifest.exists() {
            info!("Requirements file {} not found, nothing to install", manifest.display());
            return Ok(());
        }

        self.install_requirements(manifest, false)
    }

    /// Installs a single package specifier, creating the environment first
    /// if needed.
    pub fn install_package(&self, spec: &str) -> Result<(), EnvError> {
        if !self.paths.is_installed() {
            self.create(None)?;
        }

        info!("Installing {}", spec);
        self.runner.run(&self.pip().arg("install").arg(spec))?;
        Ok(())
    }

    /// Removes a single package.
    ///
    /// Unlike [`install_package`](Self::install_package) this never creates
    /// the environment, so it fails when there is none.
    pub fn uninstall_package(&self, spec: &str) -> Result<(), EnvError> {
        info!("Uninstalling {}", spec);
        self.runner
            .run(&self.pip().args(["uninstall", "-y"]).arg(spec))?;
        Ok(())
    }

    /// Recreates the environment if missing and upgrades every package.
    pub fn rebuild(&self, manifest: Option<&Path>) -> Result<(), EnvError> {
        if !self.paths.is_installed() {
            self.create(manifest)?;
        }

        self.upgrade_pip()?;

        if let Some(manifest) = manifest.filter(|m| m.exists()) {
            self.install_requirements(manifest, true)?;
        }

        let outdated = self.outdated_packages()?;
        if outdated.is_empty() {
            info!("All packages are up to date");
        } else {
            info!("Upgrading {} outdated packages: {}", outdated.len(), outdated.join(", "));
            let upgrade = self
                .pip()
                .args(["install", "--upgrade", "-q"])
                .args(&outdated);
            self.runner.run(&upgrade)?;
        }

        self.notifier
            .notify(TITLE, "✅ Virtual environment rebuilt and packages updated.");
        Ok(())
    }

    /// Names of installed packages with a newer version available.
    pub fn outdated_packages(&self) -> Result<Vec<String>, EnvError> {
        let list = self
            .pip()
            .args(["list", "--outdated", "--format=freeze"]);
        let output = self.runner.run(&list)?;
        Ok(parse_freeze_names(&output.stdout))
    }

    /// Current state of the environment.
    pub fn status(&self) -> EnvStatus {
        EnvStatus {
            root: self.paths.root.clone(),
            site_packages: Some(self.paths.site_packages.clone()),
            python_version: Some(self.paths.python_version),
            interpreter: self.interpreter.clone(),
            installed: self.paths.is_installed(),
        }
    }

    fn load_manifest(&self, manifest: Option<&Path>) -> Result<Option<Manifest>, EnvError> {
        match manifest {
            Some(path) => Manifest::load(path),
            None => Ok(None),
        }
    }

    fn install_requirements(&self, manifest: &Path, upgrade: bool) -> Result<(), EnvError> {
        info!("Installing requirements from {}", manifest.display());
        let mut cmd = self.pip().arg("install");
        if upgrade {
            cmd = cmd.arg("--upgrade");
        }
        self.runner.run(&cmd.arg("-r").arg(manifest))?;
        Ok(())
    }
}

/// Extracts package names from `pip list --format=freeze` output.
fn parse_freeze_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split("==").next())
        .map(String::from)
        .collect()
}
