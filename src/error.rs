//! Error Types
//!
//! Failures surfaced by environment management and module loading.

use std::io;

use thiserror::Error;

/// Errors raised while managing the package environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// An external tool ran but exited unsuccessfully.
    #[error("`{command}` failed with exit code {}: {}", display_code(.code), .stderr.trim())]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external tool could not be started at all.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to determine home directory (neither XDG_STATE_HOME nor HOME is set)")]
    NoHomeDirectory,

    #[error("Unrecognized Python version output: '{0}'")]
    InvalidPythonVersion(String),
}

/// Errors raised while resolving a module.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Module '{name}' not found: {reason}")]
    NotFound { name: String, reason: String },

    /// Installing the missing module failed.
    #[error("Failed to install module '{name}': {source}")]
    Install {
        name: String,
        #[source]
        source: EnvError,
    },

    /// The resolver itself could not run.
    #[error(transparent)]
    Environment(#[from] EnvError),
}

impl LoadError {
    /// Returns true if the module simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}
