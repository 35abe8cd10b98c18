//! Environment Management Module
//!
//! Handles the isolated Python environment: where it lives, how it is
//! created and how packages get in and out of it.
//!
//! - [`paths`]: environment root and site-packages resolution
//! - [`manifest`]: requirements file parsing
//! - [`process`]: external tool invocation
//! - [`lifecycle`]: create/install/uninstall/rebuild/destroy

pub mod lifecycle;
pub mod manifest;
pub mod paths;
pub mod process;

pub use lifecycle::{remove_environment, EnvStatus, EnvironmentManager};
pub use manifest::Manifest;
pub use paths::{resolve_paths, state_home, EnvPaths, PythonVersion};
pub use process::{CommandRunner, SystemRunner, ToolCommand, ToolOutput};
