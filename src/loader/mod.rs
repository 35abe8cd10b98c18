//! On-Demand Module Loading
//!
//! Resolving a module and installing it when it is missing are two
//! separate capabilities:
//!
//! - [`ModuleLoader`]: finds a module on a search path
//! - [`Installer`]: puts a package into the environment
//!
//! [`InstallingLoader`] composes them: when resolution reports the module
//! as missing it installs it once and retries once.

pub mod installing;
pub mod interpreter;

use std::path::PathBuf;

use serde::Serialize;

use crate::environment::{CommandRunner, EnvironmentManager};
use crate::error::{EnvError, LoadError};
use crate::notify::Notifier;

pub use installing::InstallingLoader;
pub use interpreter::InterpreterLoader;

/// A successfully resolved module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleLocation {
    pub name: String,
    /// File the module loads from; `None` for namespace packages.
    pub origin: Option<PathBuf>,
}

/// Resolves modules by name.
pub trait ModuleLoader {
    fn resolve(&mut self, name: &str) -> Result<ModuleLocation, LoadError>;

    /// Replaces the directories searched before the loader's defaults,
    /// highest priority first.
    fn set_search_path(&mut self, paths: Vec<PathBuf>);

    /// Forgets anything remembered from earlier lookups.
    fn invalidate_caches(&mut self) {}
}

/// Installs packages by specifier.
pub trait Installer {
    fn install(&self, spec: &str) -> Result<(), EnvError>;
}

impl<I: Installer + ?Sized> Installer for &I {
    fn install(&self, spec: &str) -> Result<(), EnvError> {
        (**self).install(spec)
    }
}

impl<R: CommandRunner, N: Notifier> Installer for EnvironmentManager<R, N> {
    fn install(&self, spec: &str) -> Result<(), EnvError> {
        self.install_package(spec)
    }
}
