//! Cache Statistics Module
//!
//! Tracks cache performance metrics: hits, misses, additions and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing (missing, expired or evicted)
    pub misses: u64,
    /// Writes, overwrites included
    pub added: u64,
    /// Entries that left the cache for any reason
    pub evicted: u64,
}

impl Stats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Live counters shared by a cache and its handles.
///
/// Updates happen under the cache lock; atomics let [`Counters::snapshot`]
/// read them without it.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    added: AtomicU64,
    evicted: AtomicU64,
}

impl Counters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a hit or a miss depending on `found`.
    pub(crate) fn record_lookup(&self, found: bool) {
        if found {
            self.record_hit();
        } else {
            self.record_miss();
        }
    }

    pub(crate) fn record_add(&self) {
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            added: self.added.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = Counters::default();
        assert_eq!(counters.snapshot(), Stats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(Stats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = Counters::default();
        counters.record_lookup(true);
        counters.record_lookup(true);
        counters.record_lookup(true);
        counters.record_lookup(false);

        let stats = counters.snapshot();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_add_and_evictions() {
        let counters = Counters::default();
        counters.record_add();
        counters.record_add();
        counters.record_evictions(3);
        counters.record_evictions(0);

        let stats = counters.snapshot();
        assert_eq!(stats.added, 2);
        assert_eq!(stats.evicted, 3);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = Stats {
            hits: 2,
            misses: 1,
            added: 3,
            evicted: 0,
        };

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hits": 2, "misses": 1, "added": 3, "evicted": 0})
        );
    }
}
