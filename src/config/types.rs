//! Configuration types.

use crate::types::{PRIORITY_DEFAULT, Priority, TaskSort, validate_priority};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`Config`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub tasks: TasksConfig,
}

impl Config {
    /// Load a single config file (no tier merging).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // Empty or comment-only files parse as null
        let config: Option<Config> =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let config = config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_priority(self.tasks.default_priority).map_err(|e| ConfigError::Invalid {
            field: "tasks.default_priority",
            reason: e.message,
        })?;
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "database.busy_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Database location and connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// How long a writer waits for a competing transaction, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-tree/tasks.db")
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

/// Defaults applied when callers leave task fields unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority for new tasks created without one.
    #[serde(default = "default_priority")]
    pub default_priority: Priority,

    /// Ordering for root listings when none is requested.
    #[serde(default)]
    pub default_sort: TaskSort,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
            default_sort: TaskSort::default(),
        }
    }
}

fn default_priority() -> Priority {
    PRIORITY_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tasks.default_priority, 5);
        assert_eq!(config.tasks.default_sort, TaskSort::DeadlineAsc);
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tasks:\n  default_sort: priority_desc").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.tasks.default_sort, TaskSort::PriorityDesc);
        assert_eq!(config.tasks.default_priority, 5);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn load_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(Config::load(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn out_of_range_priority_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tasks:\n  default_priority: 42").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tasks.default_priority", .. }));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
