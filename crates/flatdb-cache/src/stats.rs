//! Counters reported by `\cache`.

use std::fmt;

/// Something that happened to a cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheEvent {
    Hit,
    Miss,
    /// Dropped to make room for a newer result.
    Eviction,
    /// Dropped because its table changed.
    Invalidation,
}

/// Running totals of cache events since the cache was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    evictions: u64,
    invalidations: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: CacheEvent) {
        let counter = match event {
            CacheEvent::Hit => &mut self.hits,
            CacheEvent::Miss => &mut self.misses,
            CacheEvent::Eviction => &mut self.evictions,
            CacheEvent::Invalidation => &mut self.invalidations,
        };
        *counter += 1;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Results dropped because a mutation touched their table.
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Share of lookups served from the cache, `None` before the first lookup.
    pub fn hit_rate(&self) -> Option<f64> {
        let lookups = self.hits + self.misses;
        (lookups > 0).then(|| self.hits as f64 / lookups as f64)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hits, {} misses", self.hits, self.misses)?;
        if let Some(rate) = self.hit_rate() {
            write!(f, " ({:.1}% hit rate)", rate * 100.0)?;
        }
        write!(
            f,
            ", {} evicted, {} invalidated",
            self.evictions, self.invalidations
        )
    }
}
