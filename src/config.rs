//! Runtime Configuration
//!
//! Settings come from command-line flags first, then environment
//! variables, then defaults derived from the XDG directories.
//!
//! | Setting      | Variable                | Default                                             |
//! |--------------|-------------------------|-----------------------------------------------------|
//! | env root     | `HYDE_PIP_ENV`          | `$XDG_STATE_HOME/hyde/pip_env`                      |
//! | interpreter  | `HYDE_PIP_PYTHON`       | `python3` from `PATH`                               |
//! | manifest     | `HYDE_PIP_REQUIREMENTS` | `~/.config/hypr/scripts/pyutils/requirements.txt`   |

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::environment::paths::{default_env_root, state_home_from};
use crate::error::EnvError;

pub const ENV_ROOT_VAR: &str = "HYDE_PIP_ENV";
pub const PYTHON_VAR: &str = "HYDE_PIP_PYTHON";
pub const REQUIREMENTS_VAR: &str = "HYDE_PIP_REQUIREMENTS";

/// Lazily-resolved `python3` from `PATH`, used when neither a flag nor
/// [`PYTHON_VAR`] names an interpreter.
pub static SYSTEM_PYTHON: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(output) = Command::new("which").arg("python3").output() {
        if output.status.success() {
            let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path_str.is_empty() {
                debug!("Using system python3: {}", path_str);
                return PathBuf::from(path_str);
            }
        }
    }

    warn!("python3 not found on PATH, relying on command lookup at run time");
    PathBuf::from("python3")
});

/// Location of the default requirements file relative to `home`.
pub fn default_manifest_path(home: &Path) -> PathBuf {
    home.join(".config")
        .join("hypr")
        .join("scripts")
        .join("pyutils")
        .join("requirements.txt")
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub env_root: PathBuf,
    pub python: PathBuf,
    pub manifest: PathBuf,
    pub notify: bool,
    pub verbose: bool,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub env_root: Option<PathBuf>,
    pub python: Option<PathBuf>,
    pub no_notify: bool,
    pub verbose: bool,
}

impl Settings {
    /// Builds settings from overrides, the process environment and defaults.
    pub fn load(overrides: Overrides) -> Result<Self, EnvError> {
        Self::load_with(overrides, |name| env::var_os(name))
    }

    /// Like [`load`](Self::load), reading variables through `lookup`.
    pub fn load_with<F>(overrides: Overrides, lookup: F) -> Result<Self, EnvError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        let env_root = match overrides.env_root.or_else(|| var(ENV_ROOT_VAR)) {
            Some(root) => root,
            None => default_env_root(&state_home_from(lookup("XDG_STATE_HOME"), lookup("HOME"))?),
        };

        let manifest = match var(REQUIREMENTS_VAR) {
            Some(path) => path,
            None => default_manifest_path(&var("HOME").ok_or(EnvError::NoHomeDirectory)?),
        };

        let python = overrides
            .python
            .or_else(|| var(PYTHON_VAR))
            .unwrap_or_else(|| (*SYSTEM_PYTHON).clone());

        Ok(Self {
            env_root,
            python,
            manifest,
            notify: !overrides.no_notify,
            verbose: overrides.verbose,
        })
    }
}
