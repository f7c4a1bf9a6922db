//! Storage configuration structures.
//!
//! These structures define where a FlatDB instance keeps its files and how
//! it writes and caches them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CATALOG_FILE, DEFAULT_TABLES_DIR, TABLE_FILE_EXTENSION,
};
use crate::error::{FlatError, FlatResult};

/// Main storage configuration.
///
/// All durable objects live under `root`: the catalog at
/// `root/catalog_file` and one row file per table at
/// `root/tables_dir/<table>.json`.
///
/// # Example
///
/// ```rust
/// use flatdb_common::config::StoreConfig;
///
/// let config = StoreConfig::with_root("/var/lib/flatdb");
/// assert!(config.catalog_path().ends_with("db_meta.json"));
/// assert!(config.table_path("users").ends_with("data/users.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory for all durable objects.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Catalog file name, relative to `root`.
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,

    /// Directory holding per-table row files, relative to `root`.
    #[serde(default = "default_tables_dir")]
    pub tables_dir: String,

    /// fsync files (and the containing directory) after every rewrite.
    #[serde(default)]
    pub sync_writes: bool,

    /// Query cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Query cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of cached query results. `0` disables caching.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_catalog_file() -> String {
    DEFAULT_CATALOG_FILE.to_string()
}

fn default_tables_dir() -> String {
    DEFAULT_TABLES_DIR.to_string()
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

impl CacheSettings {
    /// Returns settings that disable the cache.
    #[must_use]
    pub fn disabled() -> Self {
        Self { capacity: 0 }
    }

    /// Returns true if caching is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            catalog_file: default_catalog_file(),
            tables_dir: default_tables_dir(),
            sync_writes: false,
            cache: CacheSettings::default(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at the given directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Sets whether rewrites are synced to disk.
    #[must_use]
    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.sync_writes = enabled;
        self
    }

    /// Sets the query cache capacity.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache.capacity = capacity;
        self
    }

    /// Returns the full path of the catalog file.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.catalog_file)
    }

    /// Returns the directory holding the per-table row files.
    #[must_use]
    pub fn tables_path(&self) -> PathBuf {
        self.root.join(&self.tables_dir)
    }

    /// Returns the row file path of a table.
    #[must_use]
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.tables_path()
            .join(format!("{table}.{TABLE_FILE_EXTENSION}"))
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> FlatResult<()> {
        if self.catalog_file.trim().is_empty() {
            return Err(FlatError::InvalidConfig {
                message: "catalog_file must not be empty".to_string(),
            });
        }

        if self.tables_dir.trim().is_empty() {
            return Err(FlatError::InvalidConfig {
                message: "tables_dir must not be empty".to_string(),
            });
        }

        if Path::new(&self.catalog_file) == Path::new(&self.tables_dir) {
            return Err(FlatError::InvalidConfig {
                message: "catalog_file and tables_dir must differ".to_string(),
            });
        }

        Ok(())
    }
}
