//! Configuration structures for FlatDB.
//!
//! This module contains configuration types for the storage layer and
//! its query cache.

mod database;

pub use database::{CacheSettings, StoreConfig};
