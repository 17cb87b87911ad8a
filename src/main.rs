//! TTL LRU Cache - demo driver
//!
//! Builds a cache from environment variables, runs a small workload against
//! it (writes, reads, a loader and an expiry wait) and prints the resulting
//! statistics as JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_lru_cache::{CacheBuilder, CacheConfig};

/// Number of distinct keys written by the demo workload.
const DEMO_ITEMS: usize = 1_000;

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache (starting the sweeper if auto-clean is enabled)
/// 4. Run the workload and print statistics
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_lru_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_keys={}, default_ttl={:?}, clean_interval={:?}",
        config.max_keys, config.default_ttl, config.clean_interval
    );

    let cache = CacheBuilder::<Arc<String>>::from_config(config)
        .on_evicted(|key, _| debug!("Evicted {}", key))
        .build()
        .context("Failed to build cache")?;

    for i in 0..DEMO_ITEMS {
        cache.set(format!("item:{i}"), Arc::new(format!("payload {i}")), Duration::ZERO);
    }
    info!("Wrote {} items, cache holds {}", DEMO_ITEMS, cache.len());

    let found = (0..DEMO_ITEMS)
        .step_by(2)
        .filter(|i| cache.get(&format!("item:{i}")).is_some())
        .count();
    info!("Read back {} of {} sampled items", found, DEMO_ITEMS / 2);

    let profile = cache
        .get_with("profile:42", Duration::from_millis(200), || async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, anyhow::Error>(Arc::new("profile loaded from backend".to_string()))
        })
        .await?;
    info!("Loader returned: {}", profile);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let swept = cache.delete_expired();
    info!("Expired entries removed after wait: {}", swept);

    cache.stop_sweeper();
    println!("{}", serde_json::to_string_pretty(&cache.stats())?);

    Ok(())
}
