//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration directories from environment and defaults.
    pub fn discover() -> Self {
        // User dir: TASK_TREE_USER_DIR or ~/.task-tree
        let user_dir = std::env::var("TASK_TREE_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-tree")));

        // Project dir: TASK_TREE_PROJECT_DIR or $CWD/task-tree
        let project_dir = std::env::var("TASK_TREE_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-tree")));

        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    sources: Vec<(ConfigTier, PathBuf)>,
}

/// Read one tier's YAML as a JSON value. Missing files are skipped;
/// unreadable or malformed files are logged and skipped.
fn read_tier(tier: ConfigTier, dir: &Path) -> Option<(Value, PathBuf)> {
    let file = dir.join(CONFIG_FILE);
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(&file) {
        Ok(content) => content,
        Err(e) => {
            warn!(%tier, path = %file.display(), error = %e, "skipping unreadable config");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some((value, file)),
        Err(e) => {
            warn!(%tier, path = %file.display(), error = %e, "skipping malformed config");
            None
        }
    }
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        if let Ok(explicit_path) = std::env::var("TASK_TREE_CONFIG_PATH") {
            return Self::load_file(PathBuf::from(explicit_path));
        }

        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        let candidates = [
            (ConfigTier::Project, paths.project_dir.as_deref()),
            (ConfigTier::User, paths.user_dir.as_deref()),
        ];
        for (tier, dir) in candidates {
            if let Some((value, file)) = dir.and_then(|d| read_tier(tier, d)) {
                debug!(%tier, path = %file.display(), "config tier loaded");
                tiers.push(value);
                sources.push((tier, file));
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(tiers))?;
        if Self::apply_env_overrides(&mut config) {
            sources.push((ConfigTier::Environment, PathBuf::new()));
        }
        config.validate()?;

        Ok(Self { config, sources })
    }

    /// Load a single explicit file; tiers other than environment are ignored.
    pub fn load_file(path: PathBuf) -> Result<Self> {
        let mut config = Config::load(&path)?;
        let mut sources = vec![(ConfigTier::Project, path)];
        if Self::apply_env_overrides(&mut config) {
            sources.push((ConfigTier::Environment, PathBuf::new()));
        }
        config.validate()?;
        Ok(Self { config, sources })
    }

    /// Apply environment variable overrides. Returns whether any applied.
    fn apply_env_overrides(config: &mut Config) -> bool {
        if let Ok(db_path) = std::env::var("TASK_TREE_DB_PATH") {
            config.database.path = PathBuf::from(db_path);
            return true;
        }
        false
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Files that contributed to the configuration, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}
