//! Configuration management for utasker.
//!
//! Settings live in a YAML file, by default `<config dir>/utasker/config.yaml`.
//! Every field is optional; a missing file means all defaults.

use crate::error::Result;
use crate::tasks::{Backend, ColumnMap, LoadOptions, StoreLocation, RECORD_FIELD_NAMES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "UTASKER_CONFIG";

/// Config file path relative to the user's config directory.
pub const CONFIG_FILE_PATH: &str = "utasker/config.yaml";

/// Log level used when neither the config nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// User configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Task database file. `None` keeps tasks in memory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Store implementation.
    pub backend: Backend,

    /// Insert the example tasks into a freshly created store.
    pub seed_examples: bool,

    /// Display column order, by field name.
    pub columns: Vec<String>,

    /// Default `tracing` filter, e.g. "info" or "utasker=debug".
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            backend: Backend::default(),
            seed_examples: false,
            columns: RECORD_FIELD_NAMES.iter().map(|name| (*name).to_string()).collect(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load config from `explicit`, else `$UTASKER_CONFIG`, else the default
    /// location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_path(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, returning defaults if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save config to a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validated display column mapping.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` unless `columns` names every field once.
    pub fn column_map(&self) -> Result<ColumnMap> {
        ColumnMap::new(&self.columns)
    }

    /// Store location, with `file` taking precedence over `database`.
    #[must_use]
    pub fn store_location(&self, file: Option<&Path>) -> StoreLocation {
        let path = file.map(Path::to_path_buf).or_else(|| self.database.clone());
        StoreLocation::from_path(path.map(|p| expand_home(&p)))
    }

    /// Options for initialising a fresh store.
    #[must_use]
    pub const fn load_options(&self) -> LoadOptions {
        LoadOptions { seed_examples: self.seed_examples }
    }
}

/// Default config file location, `None` if there is no config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE_PATH))
}

/// The config file to read: `explicit`, else `$UTASKER_CONFIG`, else the
/// default location.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => default_config_path(),
    }
}

/// Replace a leading `~` with the home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
