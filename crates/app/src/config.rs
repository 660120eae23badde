//! Application configuration
//!
//! An optional TOML file; every setting has a default so a missing file is
//! not an error.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use siakad_core::{Error, Result};

/// Settings loaded from `siakad.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database file path; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Login session lifetime in hours
    pub session_hours: i64,
    /// Meetings generated when the admin does not say otherwise
    pub default_meeting_count: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            session_hours: 24 * 7,
            default_meeting_count: 16,
        }
    }
}

impl AppConfig {
    /// Load from the platform config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        let config = toml::from_str(&text)
            .map_err(|e| Error::InvalidOperation(format!("bad config file: {e}")))?;
        Ok(config)
    }

    /// Platform location of the config file
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("id", "siakad", "siakad")
            .map(|dirs| dirs.config_dir().join("siakad.toml"))
    }

    /// Database location: the configured path, or the platform data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("id", "siakad", "siakad").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;

        Ok(dirs.data_dir().join("siakad.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.session_hours, 24 * 7);
        assert_eq!(config.default_meeting_count, 16);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siakad.toml");
        fs::write(
            &path,
            "database_path = \"/tmp/siakad-test.db\"\nsession_hours = 12\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.session_hours, 12);
        assert_eq!(config.default_meeting_count, 16);
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/siakad-test.db")
        );
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siakad.toml");
        fs::write(&path, "session_hours = \"soon\"").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }
}
