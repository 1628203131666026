//! Runtime configuration for library core callers.
//!
//! # Responsibility
//! - Read store and logging settings from the process environment.
//! - Validate settings before any file or logger is touched.
//!
//! # Invariants
//! - `log_level` is always a normalized level name.
//! - `log_dir`, when set, is an absolute path.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level, normalize_log_dir};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable naming the SQLite database file.
pub const ENV_DB_PATH: &str = "LIBRARY_DB_PATH";
/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "LIBRARY_LOG_LEVEL";
/// Environment variable naming the absolute log directory.
pub const ENV_LOG_DIR: &str = "LIBRARY_LOG_DIR";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Database file. `None` selects an in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// Log directory. `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from `LIBRARY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&level).map_err(|message| ConfigError {
                key: ENV_LOG_LEVEL,
                message,
            })?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(normalize_log_dir(&dir).map_err(|message| ConfigError {
                key: ENV_LOG_DIR,
                message,
            })?);
        }

        Ok(config)
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when no directory is configured.
    pub fn init_logging(&self) -> Result<bool, String> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        let dir = dir
            .to_str()
            .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", dir.display()))?;
        init_logging(self.log_level, dir)?;
        Ok(true)
    }

    /// Opens the configured store with migrations applied.
    pub fn open_database(&self) -> DbResult<Connection> {
        match self.db_path.as_ref() {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(!config.init_logging().unwrap());
    }

    #[test]
    fn reads_and_normalizes_values() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /var/lib/library/catalog.sqlite3 "),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, "/var/log/library"),
        ]))
        .unwrap();

        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/library/catalog.sqlite3"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/library")));
    }

    #[test]
    fn rejects_invalid_values_with_key() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert_eq!(err.key, ENV_LOG_LEVEL);

        let err = CoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "relative/logs")])).unwrap_err();
        assert_eq!(err.key, ENV_LOG_DIR);
    }

    #[test]
    fn blank_values_are_unset() {
        let config = CoreConfig::from_lookup(lookup(&[(ENV_DB_PATH, "  ")])).unwrap();
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn open_database_defaults_to_memory() {
        let conn = CoreConfig::default().open_database().unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, crate::db::migrations::latest_version());
    }
}
