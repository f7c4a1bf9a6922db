//! In-memory storage.
//!
//! Keeps the exact bytes a [`FileStore`](super::FileStore) would write, so
//! encoding and corrupt-content handling behave identically.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::warn;

use flatdb_common::{FlatError, FlatResult, DEFAULT_TABLES_DIR};

use crate::catalog::Catalog;
use crate::record::Record;

use super::{decode_catalog, decode_rows, encode_json, Persistence};

/// Storage that lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Option<Vec<u8>>>,
    tables: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a table's stored bytes without any encoding.
    pub fn put_raw(&self, table: &str, bytes: impl Into<Vec<u8>>) {
        self.tables.write().insert(table.to_string(), bytes.into());
    }

    /// Returns a table's stored bytes.
    pub fn get_raw(&self, table: &str) -> Option<Vec<u8>> {
        self.tables.read().get(table).cloned()
    }
}

impl Persistence for MemoryStore {
    fn load_catalog(&self) -> FlatResult<Catalog> {
        match self.catalog.read().as_deref() {
            None => Ok(Catalog::new()),
            Some(bytes) => decode_catalog(bytes).map_err(|e| FlatError::StorageCorrupt {
                path: PathBuf::from("<memory>"),
                message: e.to_string(),
            }),
        }
    }

    fn save_catalog(&self, catalog: &Catalog) -> FlatResult<()> {
        let bytes = encode_json(catalog)?;
        *self.catalog.write() = Some(bytes);
        Ok(())
    }

    fn load_rows(&self, table: &str) -> FlatResult<Vec<Record>> {
        let tables = self.tables.read();
        let Some(bytes) = tables.get(table) else {
            return Ok(Vec::new());
        };

        Ok(decode_rows(bytes).unwrap_or_else(|e| {
            warn!(table, error = %e, "row storage is corrupt, treating table as empty");
            Vec::new()
        }))
    }

    fn save_rows(&self, table: &str, rows: &[Record]) -> FlatResult<()> {
        let bytes = encode_json(rows)?;
        self.tables.write().insert(table.to_string(), bytes);
        Ok(())
    }

    fn delete_table_storage(&self, table: &str) -> FlatResult<()> {
        match self.tables.write().remove(table) {
            Some(_) => Ok(()),
            None => Err(FlatError::StorageNotFound {
                table: table.to_string(),
                path: PathBuf::from(DEFAULT_TABLES_DIR).join(table),
            }),
        }
    }

    fn table_storage_exists(&self, table: &str) -> bool {
        self.tables.read().contains_key(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_rows_round_trip() {
        let store = MemoryStore::new();
        let rows = vec![
            Record::new(1, vec![("flag".to_string(), Value::Bool(true))]),
            Record::new(3, vec![("flag".to_string(), Value::Bool(false))]),
        ];

        store.save_rows("flags", &rows).unwrap();
        assert_eq!(store.load_rows("flags").unwrap(), rows);
    }

    #[test]
    fn test_corrupt_rows_are_empty() {
        let store = MemoryStore::new();
        store.put_raw("t", "not json");

        assert!(store.load_rows("t").unwrap().is_empty());
        assert!(store.table_storage_exists("t"));
    }

    #[test]
    fn test_delete_missing_storage() {
        let store = MemoryStore::new();
        assert!(store.delete_table_storage("t").unwrap_err().is_not_found());
    }
}
