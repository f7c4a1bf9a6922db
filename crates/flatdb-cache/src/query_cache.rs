//! Query result cache keyed by table and predicate.
//!
//! A read of `(table, predicate)` always produces the same rows until that
//! table is written again. The cache stores each read's result behind an
//! `Arc` and drops every entry of a table when the storage layer reports a
//! mutation through [`QueryCache::invalidate_table`].
//!
//! The cache is an ordinary value: whoever owns it decides its lifetime.
//! A capacity of `0` turns it into a pass-through.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::lru::LruCache;
use crate::stats::{CacheEvent, CacheStats};

/// Cache key for a table read.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct QueryKey {
    table: String,
    predicate: Option<(String, String)>,
}

impl QueryKey {
    /// Creates a key for a read of `table`, optionally filtered by a
    /// `(column, value)` equality predicate.
    pub fn new(table: impl Into<String>, predicate: Option<(&str, &str)>) -> Self {
        Self {
            table: table.into(),
            predicate: predicate.map(|(c, v)| (c.to_string(), v.to_string())),
        }
    }

    /// Returns the table this key reads.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the predicate, if any.
    pub fn predicate(&self) -> Option<(&str, &str)> {
        self.predicate.as_ref().map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.predicate {
            Some((column, value)) => write!(f, "{}:{}={}", self.table, column, value),
            None => write!(f, "{}:*", self.table),
        }
    }
}

struct Inner<R> {
    entries: LruCache<QueryKey, Arc<R>>,
    /// Table name -> live keys reading that table.
    by_table: HashMap<String, HashSet<QueryKey>>,
}

impl<R> Inner<R> {
    fn unindex(&mut self, key: &QueryKey) {
        if let Some(keys) = self.by_table.get_mut(key.table()) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_table.remove(key.table());
            }
        }
    }
}

/// A bounded cache of table read results.
///
/// # Example
///
/// ```
/// use flatdb_cache::{QueryCache, QueryKey};
///
/// let cache: QueryCache<Vec<&str>> = QueryCache::new(8);
/// let key = QueryKey::new("users", Some(("name", "Ann")));
///
/// let mut loads = 0;
/// for _ in 0..3 {
///     cache
///         .get_or_load(&key, || {
///             loads += 1;
///             Ok::<_, ()>(vec!["Ann"])
///         })
///         .unwrap();
/// }
/// assert_eq!(loads, 1);
/// ```
pub struct QueryCache<R> {
    capacity: usize,
    inner: Mutex<Inner<R>>,
}

impl<R> QueryCache<R> {
    /// Creates a cache holding at most `capacity` results.
    ///
    /// A capacity of `0` disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                by_table: HashMap::new(),
            }),
        }
    }

    /// Creates a cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Returns true if results are retained.
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Gets a cached result.
    pub fn get(&self, key: &QueryKey) -> Option<Arc<R>> {
        if !self.is_enabled() {
            return None;
        }
        self.inner.lock().entries.get(key).cloned()
    }

    /// Stores a result, evicting the least recently used one when full.
    pub fn insert(&self, key: QueryKey, result: Arc<R>) {
        if !self.is_enabled() {
            return;
        }

        let mut inner = self.inner.lock();
        if !inner.entries.contains(&key) && inner.entries.len() >= self.capacity {
            if let Some((evicted, _)) = inner.entries.pop_lru() {
                inner.entries.stats_mut().record(CacheEvent::Eviction);
                inner.unindex(&evicted);
            }
        }

        inner
            .by_table
            .entry(key.table().to_string())
            .or_default()
            .insert(key.clone());
        inner.entries.insert(key, result);
    }

    /// Returns the cached result for `key`, running `load` to produce and
    /// store it on a miss.
    ///
    /// Errors from `load` are returned unchanged and nothing is cached.
    pub fn get_or_load<E, F>(&self, key: &QueryKey, load: F) -> Result<Arc<R>, E>
    where
        F: FnOnce() -> Result<R, E>,
    {
        if let Some(hit) = self.get(key) {
            debug!(key = %key, "using cached result");
            return Ok(hit);
        }

        let result = Arc::new(load()?);
        if self.is_enabled() {
            self.insert(key.clone(), Arc::clone(&result));
            debug!(key = %key, "cached result");
        }
        Ok(result)
    }

    /// Drops every cached result that reads `table`.
    ///
    /// Call this whenever the table is created, written or dropped.
    pub fn invalidate_table(&self, table: &str) {
        let mut inner = self.inner.lock();
        let Some(keys) = inner.by_table.remove(table) else {
            return;
        };

        for key in &keys {
            inner.entries.remove(key);
        }
        debug!(table, dropped = keys.len(), "invalidated cached results");
    }

    /// Clears all cached results.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.by_table.clear();
    }

    /// Returns the number of cached results.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        *self.inner.lock().entries.stats()
    }
}

impl<R> fmt::Debug for QueryCache<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let cache: QueryCache<Vec<i32>> = QueryCache::new(8);

        let key = QueryKey::new("users", None);
        cache.insert(key.clone(), Arc::new(vec![1, 2, 3]));

        let result = cache.get(&key);
        assert_eq!(*result.unwrap(), vec![1, 2, 3]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_with_predicate() {
        let key1 = QueryKey::new("users", Some(("id", "1")));
        let key2 = QueryKey::new("users", Some(("id", "2")));
        let key3 = QueryKey::new("users", Some(("id", "1")));

        assert_ne!(key1, key2);
        assert_eq!(key1, key3);
        assert_eq!(key1.to_string(), "users:id=1");
        assert_eq!(QueryKey::new("users", None).to_string(), "users:*");
    }

    #[test]
    fn test_load_runs_once() {
        let cache: QueryCache<String> = QueryCache::new(4);
        let key = QueryKey::new("users", Some(("name", "Ann")));
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_load(&key, || {
                    calls += 1;
                    Ok::<_, ()>("Ann".to_string())
                })
                .unwrap();
            assert_eq!(*value, "Ann");
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.stats().hits(), 2);
    }

    #[test]
    fn test_load_error_is_not_cached() {
        let cache: QueryCache<u32> = QueryCache::new(4);
        let key = QueryKey::new("users", None);

        let err = cache.get_or_load(&key, || Err::<u32, _>("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_table() {
        let cache: QueryCache<String> = QueryCache::new(8);

        let users_all = QueryKey::new("users", None);
        let users_ann = QueryKey::new("users", Some(("name", "Ann")));
        let orders = QueryKey::new("orders", None);

        cache.insert(users_all.clone(), Arc::new("all".to_string()));
        cache.insert(users_ann.clone(), Arc::new("ann".to_string()));
        cache.insert(orders.clone(), Arc::new("orders".to_string()));

        cache.invalidate_table("users");

        assert!(cache.get(&users_all).is_none());
        assert!(cache.get(&users_ann).is_none());
        assert!(cache.get(&orders).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_keeps_index_consistent() {
        let cache: QueryCache<u32> = QueryCache::new(2);

        cache.insert(QueryKey::new("a", None), Arc::new(1));
        cache.insert(QueryKey::new("b", None), Arc::new(2));
        cache.insert(QueryKey::new("c", None), Arc::new(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&QueryKey::new("a", None)).is_none());
        assert_eq!(cache.stats().evictions(), 1);

        // Invalidating an evicted table is a no-op
        cache.invalidate_table("a");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_disabled_cache_always_loads() {
        let cache: QueryCache<u32> = QueryCache::disabled();
        let key = QueryKey::new("users", None);
        let mut calls = 0;

        for _ in 0..2 {
            cache
                .get_or_load(&key, || {
                    calls += 1;
                    Ok::<_, ()>(7)
                })
                .unwrap();
        }

        assert_eq!(calls, 2);
        assert!(cache.is_empty());
        assert!(!cache.is_enabled());
    }

    #[test]
    fn test_clear() {
        let cache: QueryCache<String> = QueryCache::new(4);
        cache.insert(QueryKey::new("users", None), Arc::new("x".to_string()));

        cache.clear();
        assert!(cache.is_empty());
    }
}
