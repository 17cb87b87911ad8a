//! Background Tasks Module
//!
//! Contains background tasks that run alongside a cache.
//!
//! # Tasks
//! - Sweeper: removes expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::Sweeper;
