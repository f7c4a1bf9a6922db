//! # flatdb-store
//!
//! Flat-file table storage for FlatDB.
//!
//! Tables are declared in a JSON catalog and their rows live in one JSON
//! file per table. Every operation loads the data it needs from disk and
//! every write replaces whole files, so the files are always the source of
//! truth and can be inspected or edited by hand.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Database                              │
//! │  (create/drop/insert/select/update/delete, cache upkeep)    │
//! └─────────────────────────────────────────────────────────────┘
//!                   │                          │
//!                   ▼                          ▼
//! ┌───────────────────────────────┐  ┌──────────────────────────┐
//! │  Catalog        Record Store  │  │       QueryCache         │
//! │  (schemas,      (insert/scan/ │  │  (LRU of select results, │
//! │   row counts)    update/del)  │  │   per-table invalidation)│
//! └───────────────────────────────┘  └──────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Persistence (FileStore / MemoryStore)        │
//! │  db_meta.json + data/<table>.json, atomic rewrites          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use flatdb_store::{ColumnType, Database, Predicate};
//!
//! let mut db = Database::open_memory().unwrap();
//! db.create_table(
//!     "users",
//!     vec![("name".into(), ColumnType::Str), ("age".into(), ColumnType::Int)],
//! )
//! .unwrap();
//! db.insert("users", &["Ann", "30"]).unwrap();
//!
//! let rows = db.select("users", Some(&Predicate::new("age", "30"))).unwrap();
//! assert_eq!(rows[0].id(), 1);
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod persist;
pub mod table;

mod engine;
mod ordered;
mod predicate;
mod record;
mod value;

pub use catalog::{Catalog, TableSchema};
pub use engine::Database;
pub use persist::{FileStore, MemoryStore, Persistence};
pub use predicate::Predicate;
pub use record::Record;
pub use value::{ColumnType, Value};
