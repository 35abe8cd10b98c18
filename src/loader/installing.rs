//! Install-and-retry module loading.

use std::path::PathBuf;

use log::{info, warn};

use crate::environment::EnvPaths;
use crate::error::LoadError;
use crate::notify::{Notifier, Urgency, ERROR_TITLE, TITLE};

use super::{Installer, ModuleLoader, ModuleLocation};

/// Wraps a [`ModuleLoader`] so that a missing module is installed and
/// resolved again, exactly once.
///
/// # Example
///
/// ```rust,no_run
/// use hydepip::environment::{EnvPaths, EnvironmentManager, PythonVersion, SystemRunner};
/// use hydepip::loader::{InstallingLoader, InterpreterLoader};
/// use hydepip::notify::DesktopNotifier;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let paths = EnvPaths::new("/tmp/pip_env", PythonVersion::new(3, 12));
///     let manager = EnvironmentManager::new(paths.clone(), "python3", SystemRunner, DesktopNotifier::default());
///     let resolver = InterpreterLoader::new(SystemRunner, &paths, "python3");
///
///     let mut loader = InstallingLoader::new(resolver, &manager, manager.notifier(), &paths);
///     let module = loader.load_or_install("requests")?;
///     println!("{:?}", module.origin);
///     Ok(())
/// }
/// ```
pub struct InstallingLoader<L, I, N> {
    loader: L,
    installer: I,
    notifier: N,
    search_path: Vec<PathBuf>,
}

impl<L: ModuleLoader, I: Installer, N: Notifier> InstallingLoader<L, I, N> {
    pub fn new(loader: L, installer: I, notifier: N, paths: &EnvPaths) -> Self {
        Self {
            loader,
            installer,
            notifier,
            search_path: paths.search_path(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Resolves `name`, installing the package of the same name if the
    /// first attempt reports it missing.
    pub fn load_or_install(&mut self, name: &str) -> Result<ModuleLocation, LoadError> {
        self.loader.set_search_path(self.search_path.clone());

        match self.loader.resolve(name) {
            Ok(location) => return Ok(location),
            Err(e) if e.is_not_found() => {
                info!("Module '{}' is missing: {}", name, e);
            }
            Err(e) => return Err(e),
        }

        self.notifier
            .notify(TITLE, &format!("Installing {} module...", name));

        if let Err(source) = self.installer.install(name) {
            self.report_failure(&format!("Failed to install module {}: {}", name, source));
            return Err(LoadError::Install {
                name: name.to_string(),
                source,
            });
        }

        self.loader.invalidate_caches();
        self.loader.set_search_path(self.search_path.clone());

        match self.loader.resolve(name) {
            Ok(location) => {
                self.notifier
                    .notify(TITLE, &format!("Successfully installed {}.", name));
                Ok(location)
            }
            Err(e) => {
                self.report_failure(&format!(
                    "Failed to import module {} after installation: {}",
                    name, e
                ));
                Err(e)
            }
        }
    }

    fn report_failure(&self, message: &str) {
        warn!("{}", message);
        self.notifier.send(ERROR_TITLE, message, Urgency::Critical);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::fs;
    use std::rc::Rc;

    use crate::environment::{EnvironmentManager, PythonVersion, ToolOutput};
    use crate::error::EnvError;
    use crate::loader::InterpreterLoader;
    use crate::testutil::{RecordingNotifier, RecordingRunner};

    type Available = Rc<RefCell<HashSet<String>>>;

    struct FakeLoader {
        available: Available,
        resolves: Cell<usize>,
        invalidations: usize,
        search_paths: Vec<Vec<PathBuf>>,
    }

    impl FakeLoader {
        fn new(available: Available) -> Self {
            Self {
                available,
                resolves: Cell::new(0),
                invalidations: 0,
                search_paths: Vec::new(),
            }
        }
    }

    impl ModuleLoader for FakeLoader {
        fn resolve(&mut self, name: &str) -> Result<ModuleLocation, LoadError> {
            self.resolves.set(self.resolves.get() + 1);
            if self.available.borrow().contains(name) {
                Ok(ModuleLocation {
                    name: name.to_string(),
                    origin: Some(PathBuf::from(format!("/env/{name}.py"))),
                })
            } else {
                Err(LoadError::NotFound {
                    name: name.to_string(),
                    reason: "absent".to_string(),
                })
            }
        }

        fn set_search_path(&mut self, paths: Vec<PathBuf>) {
            self.search_paths.push(paths);
        }

        fn invalidate_caches(&mut self) {
            self.invalidations += 1;
        }
    }

    struct FakeInstaller {
        available: Available,
        installs: RefCell<Vec<String>>,
        provides_module: bool,
        fails: bool,
    }

    impl FakeInstaller {
        fn new(available: Available) -> Self {
            Self {
                available,
                installs: RefCell::new(Vec::new()),
                provides_module: true,
                fails: false,
            }
        }
    }

    impl Installer for FakeInstaller {
        fn install(&self, spec: &str) -> Result<(), EnvError> {
            self.installs.borrow_mut().push(spec.to_string());
            if self.fails {
                return Err(EnvError::ToolFailed {
                    command: format!("pip install {spec}"),
                    code: Some(1),
                    stderr: "No matching distribution".to_string(),
                });
            }
            if self.provides_module {
                self.available.borrow_mut().insert(spec.to_string());
            }
            Ok(())
        }
    }

    fn env_paths() -> EnvPaths {
        EnvPaths::new("/env", PythonVersion::new(3, 12))
    }

    #[test]
    fn test_present_module_needs_no_install() {
        let available: Available = Rc::new(RefCell::new(HashSet::from(["yaml".to_string()])));
        let installer = FakeInstaller::new(available.clone());
        let notifier = RecordingNotifier::default();
        let mut loader =
            InstallingLoader::new(FakeLoader::new(available), &installer, &notifier, &env_paths());

        let location = loader.load_or_install("yaml").unwrap();

        assert_eq!(location.name, "yaml");
        assert!(installer.installs.borrow().is_empty());
        assert!(notifier.sent().is_empty());
        assert_eq!(loader.loader().search_paths, vec![env_paths().search_path()]);
    }

    #[test]
    fn test_missing_module_installed_once_then_resolves() {
        let available: Available = Rc::default();
        let installer = FakeInstaller::new(available.clone());
        let notifier = RecordingNotifier::default();
        let mut loader =
            InstallingLoader::new(FakeLoader::new(available), &installer, &notifier, &env_paths());

        loader.load_or_install("requests").unwrap();
        assert_eq!(*installer.installs.borrow(), vec!["requests"]);
        assert_eq!(loader.loader().resolves.get(), 2);
        assert_eq!(loader.loader().invalidations, 1);
        assert_eq!(loader.loader().search_paths.len(), 2);
        assert_eq!(
            notifier.bodies(),
            vec!["Installing requests module...", "Successfully installed requests."]
        );

        loader.load_or_install("requests").unwrap();
        assert_eq!(installer.installs.borrow().len(), 1);
    }

    #[test]
    fn test_retry_failure_is_critical_and_propagated() {
        let available: Available = Rc::default();
        let mut installer = FakeInstaller::new(available.clone());
        installer.provides_module = false;
        let notifier = RecordingNotifier::default();
        let mut loader =
            InstallingLoader::new(FakeLoader::new(available), &installer, &notifier, &env_paths());

        let err = loader.load_or_install("ghost").unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(installer.installs.borrow().len(), 1);
        assert_eq!(loader.loader().resolves.get(), 2);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].title, ERROR_TITLE);
        assert_eq!(sent[1].urgency, Urgency::Critical);
        assert!(sent[1].body.starts_with("Failed to import module ghost"));
    }

    #[test]
    fn test_install_failure_skips_retry() {
        let available: Available = Rc::default();
        let mut installer = FakeInstaller::new(available.clone());
        installer.fails = true;
        let notifier = RecordingNotifier::default();
        let mut loader =
            InstallingLoader::new(FakeLoader::new(available), &installer, &notifier, &env_paths());

        let err = loader.load_or_install("ghost").unwrap_err();

        assert!(matches!(err, LoadError::Install { .. }));
        assert_eq!(loader.loader().resolves.get(), 1);

        let sent = notifier.sent();
        assert_eq!(sent[1].urgency, Urgency::Critical);
        assert!(sent[1].body.starts_with("Failed to install module ghost"));
        assert!(!sent[1].body.contains("after installation"));
    }

    #[test]
    fn test_resolver_error_does_not_install() {
        let temp_dir = tempfile::tempdir().unwrap();
        let paths = EnvPaths::new(temp_dir.path().join("pip_env"), PythonVersion::new(3, 12));
        fs::create_dir_all(paths.root.join("bin")).unwrap();
        fs::write(paths.pip(), "").unwrap();

        let runner = RecordingRunner::new();
        runner.respond("find_spec", ToolOutput::failure(1, "ValueError: Empty module name"));

        let notifier = RecordingNotifier::default();
        let manager = EnvironmentManager::new(paths.clone(), "python3", &runner, &notifier);
        let resolver = InterpreterLoader::new(&runner, &paths, "python3");
        let mut loader = InstallingLoader::new(resolver, &manager, &notifier, &paths);

        let err = loader.load_or_install("").unwrap_err();

        assert!(matches!(err, LoadError::Environment(EnvError::ToolFailed { .. })));
        assert_eq!(runner.count("bin/pip"), 0);
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_with_environment_manager_installs_through_pip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let paths = EnvPaths::new(temp_dir.path().join("pip_env"), PythonVersion::new(3, 12));
        fs::create_dir_all(paths.root.join("bin")).unwrap();
        fs::write(paths.pip(), "").unwrap();

        let runner = RecordingRunner::new();
        runner.respond("find_spec", ToolOutput::failure(3, ""));
        runner.respond("find_spec", ToolOutput::success("/env/mpd/__init__.py\n"));

        let notifier = RecordingNotifier::default();
        let manager = EnvironmentManager::new(paths.clone(), "python3", &runner, &notifier);
        let resolver = InterpreterLoader::new(&runner, &paths, "python3");
        let mut loader = InstallingLoader::new(resolver, &manager, &notifier, &paths);

        let location = loader.load_or_install("mpd").unwrap();

        assert_eq!(location.origin, Some(PathBuf::from("/env/mpd/__init__.py")));
        assert_eq!(runner.count("install mpd"), 1);
        assert_eq!(runner.count("find_spec"), 2);
    }
}
