//! Cache Store Module
//!
//! The cache engine: the LRU index behind a single lock, plus default TTL,
//! statistics, the eviction callback and the optional sweeper.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::stats::Counters;
use crate::cache::{LruIndex, Stats};
use crate::config::{CacheBuilder, EvictionCallback};
use crate::error::{CacheError, Result};
use crate::tasks::Sweeper;

/// State shared by every handle of one cache and weakly by its sweeper.
pub(crate) struct Shared<V> {
    /// The whole index sits behind this one lock
    index: Mutex<LruIndex<V>>,
    counters: Counters,
    default_ttl: Duration,
    on_evicted: Option<EvictionCallback<V>>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<V> Shared<V> {
    /// Runs `op` under the lock, then settles whatever left the index.
    fn with_index<R>(&self, op: impl FnOnce(&mut LruIndex<V>, Instant) -> R) -> R {
        let mut index = self.index.lock();
        let result = op(&mut *index, Instant::now());
        let departures = index.take_departures();
        self.settle(departures);
        result
    }

    /// Counts departed entries and hands them to the eviction callback.
    ///
    /// Callers hold the index lock.
    fn settle(&self, departures: Vec<(String, V)>) {
        if departures.is_empty() {
            return;
        }
        self.counters.record_evictions(departures.len() as u64);
        for (key, value) in &departures {
            trace!("Evicted key {}", key);
            if let Some(callback) = &self.on_evicted {
                callback(key, value);
            }
        }
    }

    fn delete_expired(&self) -> usize {
        self.with_index(|index, now| index.remove_expired(now))
    }
}

// == Cache ==
/// Thread-safe key/value cache with TTL expiration and LRU eviction.
///
/// `Cache` is a handle: clones share the same entries, statistics and
/// sweeper. Expired entries are never returned; they are removed lazily on
/// access, by [`Cache::keys`], or by [`Cache::delete_expired`] (which the
/// sweeper calls periodically).
///
/// Reads hand out clones of the stored value. Wrap expensive values in
/// [`std::sync::Arc`].
pub struct Cache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Starts configuring a new cache.
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    // == Constructor ==
    /// Creates a cache from already validated settings, without a sweeper.
    pub(crate) fn from_settings(
        capacity: usize,
        default_ttl: Duration,
        on_evicted: Option<EvictionCallback<V>>,
    ) -> Self {
        debug!(
            "Cache created: capacity={}, default_ttl={:?}, on_evicted={}",
            capacity,
            default_ttl,
            on_evicted.is_some()
        );
        Self {
            shared: Arc::new(Shared {
                index: Mutex::new(LruIndex::new(capacity)),
                counters: Counters::default(),
                default_ttl,
                on_evicted,
                sweeper: Mutex::new(None),
            }),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring after `ttl`.
    ///
    /// A zero `ttl` applies the configured default. Writing an existing key
    /// replaces its value, restarts its TTL and makes it most recently used.
    /// Writing a new key into a full cache evicts the least recently used
    /// entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let ttl = if ttl.is_zero() {
            self.shared.default_ttl
        } else {
            ttl
        };

        self.shared.with_index(|index, now| {
            index.add(key, value, ttl, now);
            self.shared.counters.record_add();
        });
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired, making it
    /// most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        self.shared.with_index(|index, now| {
            let value = index.get(key, now).cloned();
            self.shared.counters.record_lookup(value.is_some());
            value
        })
    }

    // == Peek ==
    /// Like [`Cache::get`] but leaves the eviction order untouched.
    pub fn peek(&self, key: &str) -> Option<V> {
        self.shared.with_index(|index, now| {
            let value = index.peek(key, now).cloned();
            self.shared.counters.record_lookup(value.is_some());
            value
        })
    }

    // == Keys ==
    /// Returns live keys from most to least recently used, removing any
    /// expired entries found along the way.
    pub fn keys(&self) -> Vec<String> {
        self.shared.with_index(|index, now| index.keys(now))
    }

    // == Length ==
    /// Returns the number of entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.shared.index.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries, 0 = unbounded.
    pub fn capacity(&self) -> usize {
        self.shared.index.lock().capacity()
    }

    /// TTL applied to writes that pass a zero TTL.
    pub fn default_ttl(&self) -> Duration {
        self.shared.default_ttl
    }

    // == Invalidate ==
    /// Removes `key`. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.shared.with_index(|index, _| index.remove(key))
    }

    /// Removes every entry whose key matches `predicate`, returning how many
    /// were removed.
    ///
    /// The predicate runs under the cache lock and must not use this cache.
    pub fn invalidate_fn<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        self.shared
            .with_index(|index, _| index.remove_matching(predicate))
    }

    // == Remove Oldest ==
    /// Removes the least recently used entry and returns its key.
    pub fn remove_oldest(&self) -> Option<String> {
        self.shared.with_index(|index, _| index.remove_oldest())
    }

    /// Removes the least recently used entry only if it has expired.
    pub fn remove_oldest_if_expired(&self) -> bool {
        self.shared
            .with_index(|index, now| index.remove_oldest_if_expired(now))
    }

    // == Delete Expired ==
    /// Removes every expired entry and returns how many were removed.
    pub fn delete_expired(&self) -> usize {
        self.shared.delete_expired()
    }

    // == Purge ==
    /// Removes every entry, counting each as evicted and running the eviction
    /// callback for each. The index is replaced by an empty one of the same
    /// capacity. Returns the number of entries removed.
    pub fn purge(&self) -> usize {
        let mut index = self.shared.index.lock();
        let capacity = index.capacity();
        let old = mem::replace(&mut *index, LruIndex::new(capacity));

        let entries = old.into_entries();
        let count = entries.len();
        self.shared.settle(entries);
        debug!("Purged {} entries", count);
        count
    }

    // == Stats ==
    /// Returns a snapshot of the hit/miss/added/evicted counters.
    pub fn stats(&self) -> Stats {
        self.shared.counters.snapshot()
    }

    // == Sweeper ==
    /// Starts (or restarts) the background sweeper, which calls
    /// [`Cache::delete_expired`] every `interval`.
    ///
    /// The sweeper only holds a weak reference: it exits once every handle to
    /// this cache is dropped.
    pub fn start_sweeper(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(CacheError::InvalidCleanInterval);
        }

        let sweeper = Sweeper::spawn(
            Arc::downgrade(&self.shared),
            interval,
            Shared::<V>::delete_expired,
        )?;
        let previous = self.shared.sweeper.lock().replace(sweeper);
        drop(previous);
        Ok(())
    }

    /// Stops the background sweeper, waiting for an in-flight sweep to
    /// finish. Returns whether a sweeper was running.
    pub fn stop_sweeper(&self) -> bool {
        let sweeper = self.shared.sweeper.lock().take();
        match sweeper {
            Some(sweeper) => {
                sweeper.stop();
                true
            }
            None => false,
        }
    }

    pub fn has_sweeper(&self) -> bool {
        self.shared
            .sweeper
            .lock()
            .as_ref()
            .is_some_and(Sweeper::is_running)
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.shared.index.lock();
        f.debug_struct("Cache")
            .field("len", &index.len())
            .field("capacity", &index.capacity())
            .field("default_ttl", &self.shared.default_ttl)
            .field("stats", &self.shared.counters.snapshot())
            .finish()
    }
}
