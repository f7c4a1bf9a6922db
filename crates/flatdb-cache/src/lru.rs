//! LRU (Least Recently Used) Cache implementation.
//!
//! Entries carry a monotonically increasing access tick. A `HashMap` gives
//! key lookup and a `BTreeMap` ordered by tick gives the eviction order, so
//! every operation is `O(log n)` without any unsafe list juggling.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::stats::{CacheEvent, CacheStats};

struct Entry<V> {
    value: V,
    tick: u64,
}

/// A bounded LRU cache.
///
/// # Example
///
/// ```
/// use flatdb_cache::lru::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// assert_eq!(cache.get(&"a"), Some(&1));
///
/// // Adding a third item evicts "b" (least recently used)
/// cache.insert("c", 3);
/// assert_eq!(cache.get(&"b"), None);
/// ```
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, Entry<V>>,
    /// Access tick -> key, oldest first.
    order: BTreeMap<u64, K>,
    next_tick: u64,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates a new LRU cache with the given capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            next_tick: 0,
            stats: CacheStats::new(),
        }
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the maximum capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Gets a reference to the value for the given key.
    ///
    /// This marks the entry as recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tick = self.bump();
        match self.map.get_mut(key) {
            Some(entry) => {
                self.stats.record(CacheEvent::Hit);
                if let Some(k) = self.order.remove(&entry.tick) {
                    self.order.insert(tick, k);
                }
                entry.tick = tick;
                Some(&entry.value)
            }
            None => {
                self.stats.record(CacheEvent::Miss);
                None
            }
        }
    }

    /// Checks if the cache contains the given key without updating recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Inserts a key-value pair into the cache.
    ///
    /// If the key already exists, updates the value and returns the old value.
    /// If the cache is at capacity, evicts the least recently used entry.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let tick = self.bump();

        if let Some(entry) = self.map.get_mut(&key) {
            self.order.remove(&entry.tick);
            self.order.insert(tick, key);
            entry.tick = tick;
            return Some(std::mem::replace(&mut entry.value, value));
        }

        if self.map.len() >= self.capacity && self.pop_lru().is_some() {
            self.stats.record(CacheEvent::Eviction);
        }

        self.order.insert(tick, key.clone());
        self.map.insert(key, Entry { value, tick });
        None
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        let entry = self.map.remove(&key)?;
        Some((key, entry.value))
    }

    /// Removes an entry from the cache.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.map.remove(key)?;
        self.order.remove(&entry.tick);
        self.stats.record(CacheEvent::Invalidation);
        Some(entry.value)
    }

    /// Clears all entries from the cache.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    fn bump(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut cache = LruCache::new(3);

        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"z"), None);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_update_existing() {
        let mut cache = LruCache::new(2);

        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("a", 10), Some(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(&10));
    }

    #[test]
    fn test_eviction_respects_recency() {
        let mut cache = LruCache::new(2);

        cache.insert("a", 1);
        cache.insert("b", 2);
        // Touch "a" so "b" becomes the eviction candidate
        cache.get(&"a");
        cache.insert("c", 3);

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn test_pop_lru() {
        let mut cache = LruCache::new(4);
        cache.insert(1, "one");
        cache.insert(2, "two");

        assert_eq!(cache.pop_lru(), Some((1, "one")));
        assert_eq!(cache.pop_lru(), Some((2, "two")));
        assert_eq!(cache.pop_lru(), None);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = LruCache::new(4);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        assert_eq!(cache.remove("a"), Some(1));
        assert_eq!(cache.remove("a"), None);
        assert_eq!(cache.stats().invalidations(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = LruCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&"b"));
    }
}
