/// Service configuration loader - parses climate_api.toml
///
/// Every setting has a default, so the file is optional. Values are layered
/// in this order, later winning: built-in defaults, the TOML file, the
/// `DATABASE_PATH` environment variable (a `.env` file is honoured), and
/// finally command-line flags applied by the binary.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "climate_api.toml";

/// Environment variable overriding the data file location.
pub const DATABASE_PATH_VAR: &str = "DATABASE_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("workers must be at least 1")]
    NoWorkers,
}

/// Runtime settings for the API server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// SQLite file holding the `station` and `measurement` tables
    pub database_path: PathBuf,

    /// Listen address, e.g. "127.0.0.1:5000"
    pub bind_address: String,

    /// Request handler threads (default: 4)
    pub workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("Resources/hawaii.sqlite"),
            bind_address: "127.0.0.1:5000".to_string(),
            workers: 4,
        }
    }
}

impl ServiceConfig {
    /// Parse settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

/// Load configuration from `path`, or from `climate_api.toml` if it exists.
///
/// An explicitly named file must exist; the default file is optional.
/// `DATABASE_PATH` from the environment or `.env` overrides the file.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_config_file(default_path)?
            } else {
                ServiceConfig::default()
            }
        }
    };

    dotenv::dotenv().ok();
    if let Ok(database_path) = std::env::var(DATABASE_PATH_VAR) {
        config.database_path = PathBuf::from(database_path);
    }

    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    ServiceConfig::from_toml(&contents, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let config = ServiceConfig::default();
        assert_eq!(config.database_path, PathBuf::from("Resources/hawaii.sqlite"));
        assert_eq!(config.bind_address, "127.0.0.1:5000");
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ServiceConfig::from_toml(
            "bind_address = \"0.0.0.0:8080\"\n",
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.workers, 4);
        assert_eq!(config.database_path, PathBuf::from("Resources/hawaii.sqlite"));
    }

    #[test]
    fn test_full_file() {
        let config = ServiceConfig::from_toml(
            "database_path = \"/data/climate.sqlite\"\nbind_address = \"0.0.0.0:80\"\nworkers = 16\n",
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/data/climate.sqlite"));
        assert_eq!(config.workers, 16);
    }

    #[test]
    fn test_malformed_file_names_the_path() {
        let err = ServiceConfig::from_toml("workers = \"many\"", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ServiceConfig {
            workers: 0,
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, "workers = 2\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.workers, 2);
    }
}
