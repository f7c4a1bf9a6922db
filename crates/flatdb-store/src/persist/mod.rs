//! Persistence layer for FlatDB.
//!
//! This module moves whole snapshots of the catalog and of each table's row
//! collection to and from durable storage. It knows nothing about schemas:
//! callers hand it fully-formed values and get fully-formed values back.
//!
//! - `Persistence` trait: the storage contract used by the catalog and record store
//! - `FileStore`: pretty-printed JSON files, rewritten atomically
//! - `MemoryStore`: the same encoding kept in memory, for tests and scratch databases
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── db_meta.json        # Catalog: {"tables": {<name>: {...}}}
//! └── data/
//!     ├── users.json      # [{"ID": 1, ...}, ...]
//!     └── orders.json
//! ```
//!
//! # Corrupt Content
//!
//! A row collection that cannot be parsed is reported as an empty table and
//! logged at `warn` level. A corrupt catalog is an error: silently replacing
//! it would forget every table.

mod file;
mod memory;

#[cfg(test)]
pub(crate) mod flaky;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;

use serde::Serialize;

use flatdb_common::{FlatError, FlatResult};

use crate::catalog::Catalog;
use crate::record::Record;

/// Durable storage for the catalog and per-table row collections.
pub trait Persistence: Send + Sync + fmt::Debug {
    /// Loads the catalog, or an empty one if none has been saved yet.
    fn load_catalog(&self) -> FlatResult<Catalog>;

    /// Replaces the stored catalog with `catalog`.
    fn save_catalog(&self, catalog: &Catalog) -> FlatResult<()>;

    /// Loads a table's rows in storage order.
    ///
    /// Missing or unparsable storage yields an empty collection.
    fn load_rows(&self, table: &str) -> FlatResult<Vec<Record>>;

    /// Replaces a table's stored rows with `rows`.
    fn save_rows(&self, table: &str, rows: &[Record]) -> FlatResult<()>;

    /// Removes a table's row storage.
    ///
    /// Fails with `StorageNotFound` if there is none.
    fn delete_table_storage(&self, table: &str) -> FlatResult<()>;

    /// Returns true if the table has row storage.
    fn table_storage_exists(&self, table: &str) -> bool;
}

/// Encodes a value as JSON indented by four spaces.
pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> FlatResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| FlatError::Serialization {
            message: e.to_string(),
        })?;
    Ok(buf)
}

/// Decodes a catalog, treating blank content as an empty catalog.
pub(crate) fn decode_catalog(bytes: &[u8]) -> Result<Catalog, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Catalog::new());
    }
    serde_json::from_slice(bytes)
}

/// Decodes a row collection.
pub(crate) fn decode_rows(bytes: &[u8]) -> Result<Vec<Record>, serde_json::Error> {
    serde_json::from_slice(bytes)
}
