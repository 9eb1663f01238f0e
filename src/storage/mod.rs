// src/storage/mod.rs

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod rest;
pub mod traits;

pub use memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use rest::RestStore;
pub use traits::CounterStore;

use crate::config::StoreConfig;
use crate::error::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Picks the backend from configuration: REST first, then native Redis,
/// then the in-memory table.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn CounterStore>> {
    if let (Some(url), Some(token)) = (&config.rest_url, &config.rest_token) {
        info!(store.url = %url, "Using REST counter store");
        return Ok(Arc::new(RestStore::new(url.clone(), token.clone(), config)?));
    }

    if let Some(redis_url) = &config.redis_url {
        #[cfg(feature = "redis")]
        {
            info!("Using Redis counter store");
            return Ok(Arc::new(RedisStore::new(
                redis_url,
                config.redis_key_prefix.clone(),
            )?));
        }
        #[cfg(not(feature = "redis"))]
        warn!(
            redis.url = %redis_url,
            "REDIS_URL is set but the `redis` feature is disabled. Ignoring."
        );
    }

    warn!("No counter backend configured. Using in-memory store; counters are not durable or shared.");
    Ok(Arc::new(InMemoryStore::new()))
}
