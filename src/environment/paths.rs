//! Environment Path Resolution
//!
//! Computes where the managed environment lives and which of its
//! directories should be searched for modules.
//!
//! # Layout
//!
//! ```text
//! $XDG_STATE_HOME/hyde/pip_env/          (environment root)
//! ├── bin/pip                            (presence means "installed")
//! ├── bin/python
//! └── lib/python3.X/site-packages/
//! ```

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::error::EnvError;

use super::process::{CommandRunner, ToolCommand};

/// Script printing the interpreter's `major.minor` version.
const VERSION_SCRIPT: &str = "import sys; print('%d.%d' % sys.version_info[:2])";

/// A Python `major.minor` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Asks an interpreter for its version.
    pub fn detect<R: CommandRunner>(runner: &R, interpreter: &Path) -> Result<Self, EnvError> {
        let cmd = ToolCommand::new(interpreter).args(["-c", VERSION_SCRIPT]);
        let output = runner.run(&cmd)?;
        let version: Self = output.stdout.parse()?;
        debug!("{} reports Python {}", interpreter.display(), version);
        Ok(version)
    }
}

impl FromStr for PythonVersion {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || EnvError::InvalidPythonVersion(trimmed.to_string());

        let mut parts = trimmed.split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

        Ok(Self { major, minor })
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Resolved locations inside the managed environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvPaths {
    pub root: PathBuf,
    pub site_packages: PathBuf,
    pub python_version: PythonVersion,
}

impl EnvPaths {
    /// Builds the paths for an environment rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, version: PythonVersion) -> Self {
        let root = root.into();
        let site_packages = root
            .join("lib")
            .join(format!("python{}", version))
            .join("site-packages");
        Self {
            root,
            site_packages,
            python_version: version,
        }
    }

    /// The environment's package manager.
    pub fn pip(&self) -> PathBuf {
        self.root.join("bin").join("pip")
    }

    /// The environment's own interpreter.
    pub fn python(&self) -> PathBuf {
        self.root.join("bin").join("python")
    }

    /// The environment counts as installed only when its `pip` exists.
    pub fn is_installed(&self) -> bool {
        self.pip().exists()
    }

    /// Module search path entries, highest priority first.
    pub fn search_path(&self) -> Vec<PathBuf> {
        vec![self.site_packages.clone(), self.root.clone()]
    }
}

/// Environment root under a given state home.
pub fn default_env_root(state_home: &Path) -> PathBuf {
    state_home.join("hyde").join("pip_env")
}

/// Resolves the environment paths under `state_home` for an interpreter version.
pub fn resolve_paths(state_home: &Path, version: PythonVersion) -> EnvPaths {
    EnvPaths::new(default_env_root(state_home), version)
}

/// Returns the per-user state directory following the XDG convention.
pub fn state_home() -> Result<PathBuf, EnvError> {
    state_home_from(env::var_os("XDG_STATE_HOME"), env::var_os("HOME"))
}

/// `$XDG_STATE_HOME` when set, else `$HOME/.local/state`.
pub(crate) fn state_home_from(xdg_state_home: Option<OsString>, home: Option<OsString>) -> Result<PathBuf, EnvError> {
    if let Some(dir) = non_empty(xdg_state_home) {
        return Ok(PathBuf::from(dir));
    }

    non_empty(home)
        .map(|home| PathBuf::from(home).join(".local").join("state"))
        .ok_or(EnvError::NoHomeDirectory)
}

fn non_empty(value: Option<OsString>) -> Option<OsString> {
    value.filter(|v| !v.is_empty())
}
