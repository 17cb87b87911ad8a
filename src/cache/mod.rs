//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod entry;
mod loader;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruIndex;
pub use stats::Stats;
pub use store::Cache;
