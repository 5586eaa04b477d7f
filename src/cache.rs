//! Match result caching.
//!
//! This module provides [`MatchCache`], an LRU cache that lets a router skip
//! the linear scan of its route table for paths it has already resolved. It is
//! gated behind the `cache` feature flag and uses the [`lru`] crate
//! internally.
//!
//! Each entry maps a request path to the index of the first matching route
//! and the parameters it bound. Every table change clears the cache, so a
//! cached index always refers to the entry a fresh scan would find.
//!
//! [`CacheStats`] tracks hits, misses, and invalidations.
//!
//! # Examples
//!
//! ```
//! use dispatch_navigator::cache::MatchCache;
//! use dispatch_navigator::RouteParams;
//! use std::num::NonZeroUsize;
//!
//! let mut cache = MatchCache::new(NonZeroUsize::new(8).unwrap());
//! cache.insert("/users/7".to_string(), 2, RouteParams::from_iter([("id", "7")]));
//!
//! let hit = cache.get("/users/7").unwrap();
//! assert_eq!(hit.index, 2);
//! assert_eq!(cache.stats().hits, 1);
//! ```

use crate::{debug_log, trace_log, RouteParams};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cached outcome of matching one path against the route table.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMatch {
    /// Position of the matching entry in the table
    pub index: usize,
    /// Parameters that entry bound
    pub params: RouteParams,
}

/// Counters tracking cache hit/miss rates and invalidations.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: usize,
    /// Number of lookups that fell through to a table scan.
    pub misses: usize,
    /// Number of full cache invalidations (via [`MatchCache::clear`]).
    pub invalidations: usize,
}

impl CacheStats {
    /// Return the hit rate as a value in `0.0..=1.0`.
    ///
    /// Returns `0.0` if no lookups have been performed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache from request path to matched route.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, CachedMatch>,
    stats: CacheStats,
}

impl MatchCache {
    /// Create a cache holding at most `capacity` paths.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Drop every entry and increment the invalidation counter.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.invalidations += 1;
        debug_log!(
            "Match cache cleared: {} entries removed ({} total invalidations, hit rate: {:.1}%)",
            removed,
            self.stats.invalidations,
            self.stats.hit_rate() * 100.0
        );
    }

    /// Look up the cached match for `path`. Updates hit/miss stats.
    pub fn get(&mut self, path: &str) -> Option<CachedMatch> {
        if let Some(entry) = self.entries.get(path) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for path: '{}'", path);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for path: '{}'", path);
            None
        }
    }

    /// Remember that `path` matched the entry at `index`.
    pub fn insert(&mut self, path: String, index: usize, params: RouteParams) {
        trace_log!("Caching route #{} for path '{}'", index, path);
        self.entries.push(path, CachedMatch { index, params });
    }

    /// Return a reference to the current cache statistics.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of cached paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> MatchCache {
        MatchCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_miss_then_hit() {
        let mut cache = cache(4);
        assert!(cache.get("/a").is_none());
        assert_eq!(cache.stats().misses, 1);

        cache.insert("/a".to_string(), 0, RouteParams::new());
        assert_eq!(cache.get("/a").unwrap().index, 0);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = cache(4);
        cache.insert("/a".to_string(), 1, RouteParams::new());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_least_recent_is_evicted() {
        let mut cache = cache(2);
        cache.insert("/a".to_string(), 0, RouteParams::new());
        cache.insert("/b".to_string(), 1, RouteParams::new());
        cache.get("/a");
        cache.insert("/c".to_string(), 2, RouteParams::new());

        assert!(cache.get("/b").is_none());
        assert!(cache.get("/a").is_some());
        assert!(cache.get("/c").is_some());
    }

    #[test]
    fn test_hit_rate_calculation() {
        let mut cache = cache(8);
        cache.get("/a");
        cache.get("/b");
        cache.get("/c");

        cache.insert("/a".to_string(), 0, RouteParams::new());
        cache.insert("/b".to_string(), 0, RouteParams::new());

        cache.get("/a");
        cache.get("/b");

        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 3);
        assert!((cache.stats().hit_rate() - 0.4).abs() < 0.001);
    }
}
