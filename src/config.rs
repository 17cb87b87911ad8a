//! Configuration Module
//!
//! Cache options, their validation, loading from environment variables and
//! the builder that turns them into a running cache.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::error::{CacheError, Result};

/// Default TTL used when none is configured; long enough to never matter.
pub const NO_EXPIRY_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 10);

/// Callback run for every entry leaving the cache.
///
/// It is invoked while the cache lock is held: it must not call back into the
/// same cache (that deadlocks) and should return quickly.
pub type EvictionCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Cache configuration parameters.
///
/// Every field is optional in spirit: [`CacheConfig::default`] gives an
/// unbounded cache whose entries never expire and no sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries, 0 = unbounded, negative is rejected
    pub max_keys: i64,
    /// TTL applied to writes without an explicit one; zero means unset
    pub default_ttl: Duration,
    /// Sweeper interval, None = no background sweeper
    pub clean_interval: Option<Duration>,
}

/// Validated form of [`CacheConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settings {
    pub capacity: usize,
    pub default_ttl: Duration,
    pub clean_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_KEYS` - Maximum entries, 0 = unbounded (default: 0)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: no expiry)
    /// - `CACHE_AUTO_CLEAN` - `true`/`1` enables the background sweeper
    /// - `CACHE_CLEAN_INTERVAL_MS` - Sweeper interval (default: half the TTL)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut config = Self {
            max_keys: env_parse("CACHE_MAX_KEYS").unwrap_or(defaults.max_keys),
            default_ttl: env_parse("CACHE_DEFAULT_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.default_ttl),
            clean_interval: None,
        };

        let auto_clean = env::var("CACHE_AUTO_CLEAN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        if auto_clean {
            config.clean_interval = Some(
                env_parse("CACHE_CLEAN_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| config.recommended_clean_interval()),
            );
        }

        config
    }

    /// The default TTL with "unset" (zero) resolved to [`NO_EXPIRY_TTL`].
    pub fn effective_ttl(&self) -> Duration {
        if self.default_ttl.is_zero() {
            NO_EXPIRY_TTL
        } else {
            self.default_ttl
        }
    }

    /// Half the default TTL: no entry then outlives 1.5x its TTL in memory.
    pub fn recommended_clean_interval(&self) -> Duration {
        self.effective_ttl() / 2
    }

    pub(crate) fn validate(&self) -> Result<Settings> {
        let capacity =
            usize::try_from(self.max_keys).map_err(|_| CacheError::InvalidCapacity(self.max_keys))?;

        if self.clean_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(CacheError::InvalidCleanInterval);
        }

        Ok(Settings {
            capacity,
            default_ttl: self.effective_ttl(),
            clean_interval: self.clean_interval,
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_keys: 0,
            default_ttl: NO_EXPIRY_TTL,
            clean_interval: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// == Cache Builder ==
/// Collects options and constructs a [`Cache`].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_lru_cache::CacheBuilder;
///
/// let cache = CacheBuilder::<String>::new()
///     .max_keys(100)
///     .ttl(Duration::from_secs(30))
///     .build()
///     .unwrap();
///
/// cache.set("greeting", "hello".to_string(), Duration::ZERO);
/// assert_eq!(cache.get("greeting"), Some("hello".to_string()));
/// ```
pub struct CacheBuilder<V> {
    config: CacheConfig,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V> CacheBuilder<V> {
    pub fn new() -> Self {
        Self::from_config(CacheConfig::default())
    }

    /// Starts from an existing configuration, e.g. [`CacheConfig::from_env`].
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            on_evicted: None,
        }
    }

    /// Maximum number of entries; 0 = unbounded, negative fails at build time.
    pub fn max_keys(mut self, max_keys: i64) -> Self {
        self.config.max_keys = max_keys;
        self
    }

    /// TTL applied to writes that pass a zero TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Enables the background sweeper at the given interval.
    pub fn auto_clean(mut self, interval: Duration) -> Self {
        self.config.clean_interval = Some(interval);
        self
    }

    /// Sets the callback run for every entry leaving the cache.
    ///
    /// See [`EvictionCallback`] for the locking caveats.
    pub fn on_evicted<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.on_evicted = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<V> CacheBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Validates the options and constructs the cache, starting the sweeper
    /// when auto-clean is configured.
    pub fn build(self) -> Result<Cache<V>> {
        let settings = self.config.validate()?;
        let cache = Cache::from_settings(settings.capacity, settings.default_ttl, self.on_evicted);
        if let Some(interval) = settings.clean_interval {
            cache.start_sweeper(interval)?;
        }
        Ok(cache)
    }
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for CacheBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("config", &self.config)
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}
