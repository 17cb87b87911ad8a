//! TTL LRU Cache - an embeddable, thread-safe key/value cache
//!
//! Entries expire after a per-entry TTL and the least recently used entry is
//! evicted when the cache is full. Expiration is lazy; an optional background
//! sweeper reclaims expired entries nobody reads any more.
//!
//! ```
//! use std::time::Duration;
//! use ttl_lru_cache::Cache;
//!
//! let cache: Cache<u32> = Cache::builder().max_keys(2).build().unwrap();
//! cache.set("a", 1, Duration::ZERO);
//! cache.set("b", 2, Duration::ZERO);
//! cache.get("a");
//! cache.set("c", 3, Duration::ZERO); // evicts "b"
//!
//! assert_eq!(cache.keys(), vec!["c", "a"]);
//! assert_eq!(cache.stats().evicted, 1);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod global;
pub mod tasks;

pub use cache::{Cache, Stats};
pub use config::{CacheBuilder, CacheConfig, EvictionCallback};
pub use error::{CacheError, Result};
