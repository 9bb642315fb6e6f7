//! Configuration loading.
//!
//! Precedence (highest first): CLI flags, environment variables (including
//! values pulled in from `.env` files), `~/.heartdb/config.toml`, built-in
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// Database holding the four collections.
pub const DEFAULT_DATABASE: &str = "heart_disease_db";

pub const URI_ENV: &str = "MONGODB_URI";
pub const DATABASE_ENV: &str = "HEARTDB_DATABASE";
pub const LOG_LEVEL_ENV: &str = "HEARTDB_LOG";

/// Load environment variables from .env files
///
/// Priority order (highest to lowest):
/// 1. Environment variables already set
/// 2. Current directory .env
/// 3. ~/.heartdb/.env
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(path);
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            // dotenvy never overwrites variables that are already set
            match dotenvy::from_path(&env_file) {
                Ok(()) => {
                    debug!("Loaded .env from ~/.heartdb: {}", env_file.display());
                    loaded_from.push(env_file);
                }
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.heartdb)");
    }
}

/// Get the heartdb config directory path (~/.heartdb)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".heartdb"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_database")]
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            name: default_database(),
        }
    }
}

fn default_uri() -> String {
    DEFAULT_URI.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "heartdb_store=debug"
    pub level: Option<String>,
}

impl HeartConfig {
    /// Get config file path: ~/.heartdb/config.toml
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load the config file if present, then apply environment overrides.
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        toml::from_str(&content).map_err(|source| CoreError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup(URI_ENV) {
            self.database.uri = uri;
        }
        if let Some(name) = lookup(DATABASE_ENV) {
            self.database.name = name;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.logging.level = Some(level);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.uri.trim().is_empty() {
            return Err(CoreError::config("database uri must not be empty"));
        }
        if self.database.name.trim().is_empty() {
            return Err(CoreError::config("database name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_point_at_local_server() {
        let config = HeartConfig::default();
        assert_eq!(config.database.uri, "mongodb://localhost:27017");
        assert_eq!(config.database.name, "heart_disease_db");
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn parses_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nuri = \"mongodb://db.internal:27017\"").unwrap();

        let config = HeartConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.uri, "mongodb://db.internal:27017");
        assert_eq!(config.database.name, DEFAULT_DATABASE);
    }

    #[test]
    fn rejects_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[database\nuri = ").unwrap();

        let err = HeartConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Toml { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = HeartConfig::from_file(Path::new("/nonexistent/heartdb.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (URI_ENV, "mongodb://override:27017"),
            (LOG_LEVEL_ENV, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = HeartConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.uri, "mongodb://override:27017");
        assert_eq!(config.database.name, DEFAULT_DATABASE);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn empty_uri_fails_validation() {
        let mut config = HeartConfig::default();
        config.database.uri = "  ".into();
        assert!(matches!(config.validate(), Err(CoreError::Config { .. })));
    }
}
