//! Requirements Manifest
//!
//! A plain `requirements.txt`: one package specifier per line, with blank
//! lines and `#` comments ignored. The file is only ever read; `pip` gets
//! the original path for the actual install.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::EnvError;

/// Prefix shown before each package in notification bodies.
const DISPLAY_PREFIX: &str = "📦 ";

/// Parsed contents of a requirements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
    specifiers: Vec<String>,
}

impl Manifest {
    /// Reads a manifest. Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, EnvError> {
        if !path.exists() {
            debug!("No requirements file at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        Ok(Some(Self::parse(path, &content)))
    }

    /// Parses manifest text read from `path`.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let specifiers = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();

        Self {
            path: path.into(),
            specifiers,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package specifiers in file order.
    pub fn specifiers(&self) -> &[String] {
        &self.specifiers
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Specifiers formatted for display, one per entry.
    pub fn display_lines(&self) -> Vec<String> {
        self.specifiers
            .iter()
            .map(|spec| format!("{}{}", DISPLAY_PREFIX, spec))
            .collect()
    }

    /// Body of the "starting install" notification.
    pub fn notification_body(&self) -> String {
        format!(
            "⏳Install virtual environment Dependencies:\n {}",
            self.display_lines().join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let manifest = Manifest::parse("requirements.txt", "requests\n# comment\n\nflask==2.0");

        assert_eq!(manifest.specifiers(), &["requests", "flask==2.0"]);
        assert_eq!(manifest.display_lines(), vec!["📦 requests", "📦 flask==2.0"]);
    }

    #[test]
    fn test_parse_only_comments_is_empty() {
        let manifest = Manifest::parse("requirements.txt", "# one\n\n   \n#two\n");
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let manifest = Manifest::parse("r.txt", "  pyyaml  \r\n\t# indented comment\n");
        assert_eq!(manifest.specifiers(), &["pyyaml"]);
    }

    #[test]
    fn test_notification_body() {
        let manifest = Manifest::parse("r.txt", "requests\nflask==2.0\n");
        assert_eq!(
            manifest.notification_body(),
            "⏳Install virtual environment Dependencies:\n 📦 requests\n📦 flask==2.0"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Manifest::load(Path::new("/nonexistent/requirements.txt")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("requirements.txt");
        fs::write(&path, "pillow\n# pinned\nmpd2>=3.0\n").unwrap();

        let manifest = Manifest::load(&path).unwrap().unwrap();
        assert_eq!(manifest.path(), path.as_path());
        assert_eq!(manifest.specifiers(), &["pillow", "mpd2>=3.0"]);
    }
}
