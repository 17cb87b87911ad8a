//! Loader Module
//!
//! Get-or-compute helpers: on a miss, call a loader and store its result.
//!
//! The loader always runs with the cache unlocked, so a slow loader never
//! blocks other callers and may itself use the cache.

use std::future::Future;
use std::time::Duration;

use crate::cache::Cache;

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Returns the cached value for `key`, or runs `loader` and caches its
    /// result for `ttl` (zero = default TTL).
    ///
    /// The lookup counts one hit or one miss. A failing loader's error is
    /// returned as is and nothing is written.
    pub fn try_get_with<F, E>(&self, key: &str, ttl: Duration, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = loader()?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Async form of [`Cache::try_get_with`].
    ///
    /// Dropping the returned future while the loader is pending cancels the
    /// load; the cache is left untouched.
    pub async fn get_with<F, Fut, E>(&self, key: &str, ttl: Duration, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = loader().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}
