//! Database facade.
//!
//! `Database` is the entry point for all table operations. It owns the
//! storage configuration, the loaded catalog, the persistence backend and
//! the query cache, and keeps the cache consistent with every mutation.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use flatdb_cache::{CacheStats, QueryCache, QueryKey};
use flatdb_common::{FlatResult, StoreConfig};

use crate::catalog::{Catalog, TableSchema};
use crate::persist::{FileStore, MemoryStore, Persistence};
use crate::predicate::Predicate;
use crate::record::Record;
use crate::table;
use crate::value::ColumnType;

/// A flat-file database.
///
/// Reads take `&self` and may be served from the query cache; writes take
/// `&mut self` and drop every cached result of the table they touch, whether
/// or not they succeed.
#[derive(Debug)]
pub struct Database {
    /// Storage configuration.
    config: StoreConfig,
    /// In-memory copy of the durable catalog.
    catalog: Catalog,
    /// Persistence backend.
    store: Box<dyn Persistence>,
    /// Cached `select` results.
    cache: QueryCache<Vec<Record>>,
}

impl Database {
    /// Opens the database stored under `config.root`.
    ///
    /// A missing catalog is treated as an empty database; nothing is written
    /// until the first table is created.
    pub fn open(config: StoreConfig) -> FlatResult<Self> {
        config.validate()?;
        let store = FileStore::new(config.clone());
        Self::with_store(config, Box::new(store))
    }

    /// Opens an empty database that lives in memory.
    pub fn open_memory() -> FlatResult<Self> {
        Self::with_store(StoreConfig::default(), Box::new(MemoryStore::new()))
    }

    /// Opens a database on an arbitrary persistence backend.
    pub fn with_store(config: StoreConfig, store: Box<dyn Persistence>) -> FlatResult<Self> {
        let catalog = store.load_catalog()?;
        let cache = QueryCache::new(config.cache.capacity);

        info!(
            root = %config.root().display(),
            tables = catalog.len(),
            cache_capacity = cache.capacity(),
            "database opened"
        );

        Ok(Self {
            config,
            catalog,
            store,
            cache,
        })
    }

    /// Returns the storage configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // =========================================================================
    // Schema Operations
    // =========================================================================

    /// Creates a table with the given ordered columns.
    #[instrument(skip(self, columns), level = "debug")]
    pub fn create_table(&mut self, name: &str, columns: Vec<(String, ColumnType)>) -> FlatResult<()> {
        self.cache.invalidate_table(name);
        self.catalog.define_table(self.store.as_ref(), name, columns)
    }

    /// Drops a table and its rows.
    #[instrument(skip(self), level = "debug")]
    pub fn drop_table(&mut self, name: &str) -> FlatResult<()> {
        self.cache.invalidate_table(name);
        self.catalog.remove_table(self.store.as_ref(), name)
    }

    /// Lists table names in creation order.
    pub fn list_tables(&self) -> Vec<&str> {
        self.catalog.table_names()
    }

    /// Returns a table's schema.
    pub fn describe_table(&self, name: &str) -> FlatResult<&TableSchema> {
        self.catalog.describe_table(name)
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Inserts one record from raw text values, one per column.
    #[instrument(skip(self, values), level = "debug")]
    pub fn insert<S: AsRef<str>>(&mut self, table: &str, values: &[S]) -> FlatResult<Record> {
        self.cache.invalidate_table(table);
        table::insert(&mut self.catalog, self.store.as_ref(), table, values)
    }

    /// Returns the records of a table, optionally filtered.
    ///
    /// Results are shared with the cache; they stay valid until the next
    /// write to the table.
    #[instrument(skip(self), level = "debug")]
    pub fn select(&self, table: &str, predicate: Option<&Predicate>) -> FlatResult<Arc<Vec<Record>>> {
        // Unknown tables are never cached
        self.catalog.describe_table(table)?;

        let key = QueryKey::new(table, predicate.map(|p| (p.column(), p.value())));
        let rows = self.cache.get_or_load(&key, || {
            table::scan(&self.catalog, self.store.as_ref(), table, predicate)
        })?;

        debug!(table, rows = rows.len(), "select finished");
        Ok(rows)
    }

    /// Sets `column` to `value` on every record matching `predicate`.
    #[instrument(skip(self), level = "debug")]
    pub fn update(
        &mut self,
        table: &str,
        column: &str,
        value: &str,
        predicate: &Predicate,
    ) -> FlatResult<usize> {
        self.cache.invalidate_table(table);
        table::update_where(
            &mut self.catalog,
            self.store.as_ref(),
            table,
            column,
            value,
            predicate,
        )
    }

    /// Deletes every record matching `predicate`.
    #[instrument(skip(self), level = "debug")]
    pub fn delete(&mut self, table: &str, predicate: &Predicate) -> FlatResult<usize> {
        self.cache.invalidate_table(table);
        table::delete_where(&mut self.catalog, self.store.as_ref(), table, predicate)
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Returns query cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the number of cached results.
    pub fn cached_results(&self) -> usize {
        self.cache.len()
    }

    /// Returns true if select results are cached.
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Drops every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
