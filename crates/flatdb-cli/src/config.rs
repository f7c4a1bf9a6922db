//! Configuration file support for the CLI.
//!
//! Loads and saves CLI configuration from TOML files. Every key is optional;
//! missing keys take their defaults and command-line flags override both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use flatdb_common::{StoreConfig, DEFAULT_CACHE_CAPACITY};

use crate::formatter::OutputFormat;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory holding the catalog and table files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Default output format.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Report how long inserts and selects take.
    #[serde(default = "default_true")]
    pub timing: bool,

    /// Ask before dropping tables or deleting records.
    #[serde(default = "default_true")]
    pub confirm_destructive: bool,

    /// History file path.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    /// Maximum history size.
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Number of cached select results. `0` disables the cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// fsync every rewritten file.
    #[serde(default)]
    pub sync_writes: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_format() -> String {
    "table".to_string()
}

fn default_true() -> bool {
    true
}

fn default_history_size() -> usize {
    1000
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_format: default_format(),
            timing: true,
            confirm_destructive: true,
            history_file: None,
            history_size: default_history_size(),
            cache_capacity: default_cache_capacity(),
            sync_writes: false,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. ~/.config/flatdb/config.toml
    /// 2. ~/.flatdb/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let xdg = dirs::config_dir().map(|d| d.join("flatdb").join("config.toml"));
        let home = dirs::home_dir().map(|h| h.join(".flatdb").join("config.toml"));
        xdg.into_iter().chain(home).collect()
    }

    /// Returns the parsed default output format.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.output_format
            .parse()
            .with_context(|| format!("invalid output_format '{}'", self.output_format))
    }

    /// Returns the history file, defaulting to the user's data directory.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("flatdb").join("history")))
    }

    /// Builds the storage configuration for the database.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::with_root(&self.data_dir)
            .cache_capacity(self.cache_capacity)
            .sync_writes(self.sync_writes)
    }
}
