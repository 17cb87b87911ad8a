//! Default Cache Module
//!
//! A process-wide cache, built on first use, for callers that do not want to
//! construct and pass around their own instance. Values are JSON values so any
//! serializable payload can be stored.

use std::time::Duration;

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::warn;

use crate::cache::Cache;

/// Capacity of the default cache.
pub const DEFAULT_MAX_KEYS: usize = 10_000;
/// TTL of entries written through [`set`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(1);
/// Sweep interval of the default cache, half its TTL.
pub const DEFAULT_CLEAN_INTERVAL: Duration = Duration::from_millis(500);

static DEFAULT_CACHE: Lazy<Cache<Value>> = Lazy::new(|| {
    let cache = Cache::from_settings(DEFAULT_MAX_KEYS, DEFAULT_TTL, None);
    if let Err(err) = cache.start_sweeper(DEFAULT_CLEAN_INTERVAL) {
        warn!("Default cache running without sweeper: {}", err);
    }
    cache
});

/// The shared default cache.
pub fn default_cache() -> &'static Cache<Value> {
    &DEFAULT_CACHE
}

/// Stores `value` in the default cache with the default TTL.
pub fn set(key: impl Into<String>, value: impl Into<Value>) {
    DEFAULT_CACHE.set(key, value.into(), Duration::ZERO);
}

/// Reads `key` from the default cache.
pub fn get(key: &str) -> Option<Value> {
    DEFAULT_CACHE.get(key)
}

/// Removes `key` from the default cache.
pub fn del(key: &str) {
    DEFAULT_CACHE.invalidate(key);
}
