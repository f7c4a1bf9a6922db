//! Memory store with switchable write failures.

use std::sync::atomic::{AtomicBool, Ordering};

use flatdb_common::{FlatError, FlatResult};

use super::{MemoryStore, Persistence};
use crate::catalog::Catalog;
use crate::record::Record;

#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    fail_catalog: AtomicBool,
    fail_delete: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn fail_catalog_saves(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

impl Persistence for FlakyStore {
    fn load_catalog(&self) -> FlatResult<Catalog> {
        self.inner.load_catalog()
    }

    fn save_catalog(&self, catalog: &Catalog) -> FlatResult<()> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(FlatError::internal("catalog write refused"));
        }
        self.inner.save_catalog(catalog)
    }

    fn load_rows(&self, table: &str) -> FlatResult<Vec<Record>> {
        self.inner.load_rows(table)
    }

    fn save_rows(&self, table: &str, rows: &[Record]) -> FlatResult<()> {
        self.inner.save_rows(table, rows)
    }

    fn delete_table_storage(&self, table: &str) -> FlatResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(FlatError::internal("delete refused"));
        }
        self.inner.delete_table_storage(table)
    }

    fn table_storage_exists(&self, table: &str) -> bool {
        self.inner.table_storage_exists(table)
    }
}
