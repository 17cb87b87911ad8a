//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A missing key is never an
//! error; lookups return `Option`.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised while constructing a cache or starting its sweeper.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Capacity below zero
    #[error("Invalid capacity: {0} (must be 0 for unbounded or positive)")]
    InvalidCapacity(i64),

    /// Auto-clean requested with a zero interval
    #[error("Invalid clean interval: must be greater than zero")]
    InvalidCleanInterval,

    /// The background sweeper thread could not be started
    #[error("Failed to spawn sweeper thread: {0}")]
    SweeperSpawn(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
