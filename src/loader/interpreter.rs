//! Module resolution through a Python interpreter.

use std::collections::HashSet;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::environment::{CommandRunner, EnvPaths, ToolCommand};
use crate::error::{EnvError, LoadError};

use super::{ModuleLoader, ModuleLocation};

/// Exit status used by [`FIND_SPEC_SCRIPT`] when the module does not exist.
/// Any other failure (bad name, broken interpreter) is not a miss.
const MISSING_EXIT_CODE: i32 = 3;

const FIND_SPEC_SCRIPT: &str = "\
import importlib.util, sys
try:
    spec = importlib.util.find_spec(sys.argv[1])
except ImportError:
    sys.exit(3)
if spec is None:
    sys.exit(3)
print(spec.origin or '')
";

/// Asks a Python interpreter where a module would be imported from.
///
/// Uses the environment's own interpreter once it exists and the system
/// interpreter before that. Misses are remembered until
/// [`invalidate_caches`](ModuleLoader::invalidate_caches) is called.
pub struct InterpreterLoader<R> {
    runner: R,
    env_python: PathBuf,
    fallback: PathBuf,
    search_path: Vec<PathBuf>,
    misses: HashSet<String>,
}

impl<R: CommandRunner> InterpreterLoader<R> {
    pub fn new(runner: R, paths: &EnvPaths, fallback: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            env_python: paths.python(),
            fallback: fallback.into(),
            search_path: Vec::new(),
            misses: HashSet::new(),
        }
    }

    fn interpreter(&self) -> &Path {
        if self.env_python.exists() {
            &self.env_python
        } else {
            &self.fallback
        }
    }

    fn find_spec_command(&self, name: &str) -> Result<ToolCommand, EnvError> {
        let mut cmd = ToolCommand::new(self.interpreter())
            .args(["-c", FIND_SPEC_SCRIPT])
            .arg(name);

        if !self.search_path.is_empty() {
            let joined = env::join_paths(&self.search_path)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            cmd = cmd.env("PYTHONPATH", joined);
        }

        Ok(cmd)
    }
}

impl<R: CommandRunner> ModuleLoader for InterpreterLoader<R> {
    fn resolve(&mut self, name: &str) -> Result<ModuleLocation, LoadError> {
        if self.misses.contains(name) {
            return Err(LoadError::NotFound {
                name: name.to_string(),
                reason: "not found on a previous lookup".to_string(),
            });
        }

        let cmd = self.find_spec_command(name)?;
        debug!("Resolving module '{}' with {}", name, cmd.program.display());

        let output = self.runner.output(&cmd).map_err(|source| EnvError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

        if output.is_success() {
            let origin = output.stdout.trim();
            return Ok(ModuleLocation {
                name: name.to_string(),
                origin: (!origin.is_empty()).then(|| PathBuf::from(origin)),
            });
        }

        if output.code != Some(MISSING_EXIT_CODE) {
            return Err(LoadError::Environment(EnvError::ToolFailed {
                command: cmd.to_string(),
                code: output.code,
                stderr: output.stderr,
            }));
        }

        self.misses.insert(name.to_string());
        Err(LoadError::NotFound {
            name: name.to_string(),
            reason: "no module with this name on the search path".to_string(),
        })
    }

    fn set_search_path(&mut self, paths: Vec<PathBuf>) {
        self.search_path = paths;
    }

    fn invalidate_caches(&mut self) {
        self.misses.clear();
    }
}
