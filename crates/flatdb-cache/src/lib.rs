//! Query result caching for FlatDB.
//!
//! Every read of a table loads and filters its whole row file. This crate
//! lets the storage layer remember the outcome of a read and hand it back
//! until the table changes:
//!
//! - **LRU Cache**: bounded Least Recently Used map
//! - **Query Cache**: `(table, predicate)` keyed results with per-table invalidation
//! - **Stats**: hit/miss/eviction counters
//!
//! # Example
//!
//! ```rust
//! use flatdb_cache::{QueryCache, QueryKey};
//!
//! let cache: QueryCache<Vec<u32>> = QueryCache::new(16);
//! let key = QueryKey::new("users", None);
//!
//! let first = cache.get_or_load(&key, || Ok::<_, ()>(vec![1, 2])).unwrap();
//! let second = cache.get_or_load(&key, || Ok::<_, ()>(vec![9])).unwrap();
//! assert_eq!(*first, *second);
//!
//! cache.invalidate_table("users");
//! assert!(cache.get(&key).is_none());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lru;
pub mod query_cache;
pub mod stats;

pub use lru::LruCache;
pub use query_cache::{QueryCache, QueryKey};
pub use stats::CacheStats;
