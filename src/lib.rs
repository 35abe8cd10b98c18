//! hydepip - Python Environment Manager for HyDE
//!
//! Keeps a single isolated Python environment for the HyDE desktop
//! scripts and installs modules into it on demand.
//!
//! # Architecture
//!
//! - [`environment`]: path resolution, requirements parsing and the
//!   create/install/rebuild/destroy lifecycle
//! - [`loader`]: module resolution with install-and-retry
//! - [`notify`]: desktop notifications
//! - [`config`]: settings from flags, environment variables and XDG defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use hydepip::environment::{state_home, resolve_paths, EnvironmentManager, PythonVersion, SystemRunner};
//! use hydepip::notify::DesktopNotifier;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let version = PythonVersion::detect(&SystemRunner, Path::new("python3"))?;
//!     let paths = resolve_paths(&state_home()?, version);
//!
//!     let manager = EnvironmentManager::new(paths, "python3", SystemRunner, DesktopNotifier::default());
//!     manager.install_package("pyyaml")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod loader;
pub mod notify;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use environment::{EnvPaths, EnvironmentManager, PythonVersion};
pub use error::{EnvError, LoadError};
pub use loader::{InstallingLoader, ModuleLoader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "hydepip";
