//! Optional TOML configuration file.
//!
//! ```toml
//! log_level = "debug"
//! storage_path = "/var/lib/segdb"
//! ```
//!
//! Command-line flags take precedence over the file.

use segdb_core::DEFAULT_STORAGE_PATH;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Tracing filter directive, for example `info` or `segdb_core=debug`.
    pub log_level: Option<String>,
    /// Segment directory.
    pub storage_path: Option<PathBuf>,
}

impl FileConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Settings after merging flags over the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Tracing filter directive.
    pub log_level: String,
    /// Segment directory.
    pub storage_path: PathBuf,
}

impl Settings {
    /// Merges command-line flags over file values over defaults.
    pub fn resolve(file: FileConfig, path_flag: Option<PathBuf>, verbose: bool) -> Self {
        let log_level = if verbose {
            "debug".to_string()
        } else {
            file.log_level.unwrap_or_else(|| "info".to_string())
        };
        let storage_path = path_flag
            .or(file.storage_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));
        Self {
            log_level,
            storage_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_full_file() {
        let config = FileConfig::parse(
            "log_level = \"warn\"\nstorage_path = \"/srv/segments\"\n",
            Path::new("segdb.toml"),
        )
        .unwrap();
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.storage_path, Some(PathBuf::from("/srv/segments")));
    }

    #[test]
    fn parse_rejects_unknown_keys() {
        let result = FileConfig::parse("port = 8080\n", Path::new("segdb.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let result = FileConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("segdb.toml");
        fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.storage_path, None);
    }

    #[test]
    fn flags_take_precedence() {
        let file = FileConfig {
            log_level: Some("warn".into()),
            storage_path: Some(PathBuf::from("/from/file")),
        };

        let settings = Settings::resolve(file.clone(), Some(PathBuf::from("/from/flag")), false);
        assert_eq!(settings.storage_path, PathBuf::from("/from/flag"));
        assert_eq!(settings.log_level, "warn");

        let settings = Settings::resolve(file, None, true);
        assert_eq!(settings.storage_path, PathBuf::from("/from/file"));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn defaults_without_file() {
        let settings = Settings::resolve(FileConfig::default(), None, false);
        assert_eq!(settings.storage_path, PathBuf::from("var/lib/segdb"));
        assert_eq!(settings.log_level, "info");
    }
}
