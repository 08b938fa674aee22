use std::sync::Arc;
use std::time::Duration;

use quire_cache::CacheStore;
use quire_cache_memory::{MemoryCacheStore, spawn_sweeper};
#[cfg(feature = "redis")]
use quire_cache_redis::{RedisCacheConfig, RedisCacheStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::CacheConfig;
use crate::error::RuntimeError;

/// Create the cache selected by `config`.
///
/// A configured `url` selects Redis. Otherwise an in-process cache is built
/// and a sweeper task is spawned that runs until `cancel` fires.
pub fn create_cache(
    config: &CacheConfig,
    cancel: &CancellationToken,
) -> Result<Arc<dyn CacheStore>, RuntimeError> {
    let Some(url) = config.url.as_deref() else {
        let store = Arc::new(MemoryCacheStore::new());
        let interval = Duration::from_secs(config.sweep_interval_seconds.max(1));
        spawn_sweeper(Arc::clone(&store), interval, cancel.clone());
        info!(
            sweep_interval_seconds = interval.as_secs(),
            "in-process cache initialized"
        );
        return Ok(store);
    };

    create_redis(config, url)
}

#[cfg(feature = "redis")]
fn create_redis(config: &CacheConfig, url: &str) -> Result<Arc<dyn CacheStore>, RuntimeError> {
    let redis_config = RedisCacheConfig {
        url: url.to_owned(),
        prefix: config.prefix.clone(),
        pool_size: config.pool_size,
        connection_timeout: Duration::from_secs(config.connection_timeout_seconds),
        ..RedisCacheConfig::default()
    };
    let store = RedisCacheStore::new(&redis_config)?;
    info!(prefix = %config.prefix, "redis cache initialized");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
fn create_redis(_config: &CacheConfig, _url: &str) -> Result<Arc<dyn CacheStore>, RuntimeError> {
    Err(RuntimeError::Config(
        "[cache] url is set but the redis feature is disabled".into(),
    ))
}

#[cfg(test)]
mod tests {
    use quire_cache::CacheKey;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn no_url_selects_memory() {
        let cancel = CancellationToken::new();
        let cache = create_cache(&CacheConfig::default(), &cancel).unwrap();
        let key = CacheKey::new("companies", "find_all", &json!({})).unwrap();
        cache.set(&key, "v", Duration::from_secs(5)).await.unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("v"));
        cancel.cancel();
    }

    #[cfg(feature = "redis")]
    #[tokio::test]
    async fn malformed_url_is_rejected() {
        let config = CacheConfig {
            url: Some("not a url".into()),
            ..CacheConfig::default()
        };
        let cancel = CancellationToken::new();
        assert!(matches!(
            create_cache(&config, &cancel),
            Err(RuntimeError::Cache(_))
        ));
    }

    #[cfg(feature = "redis")]
    #[tokio::test]
    async fn glob_prefix_is_rejected() {
        let config = CacheConfig {
            url: Some("redis://127.0.0.1:6379".into()),
            prefix: "quire*".into(),
            ..CacheConfig::default()
        };
        let cancel = CancellationToken::new();
        assert!(matches!(
            create_cache(&config, &cancel),
            Err(RuntimeError::Cache(quire_cache::CacheError::Configuration(_)))
        ));
    }
}
