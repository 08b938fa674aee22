use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use quire_cache::error::CacheError;
use quire_cache::key::CacheKey;
use quire_cache::store::CacheStore;

use crate::config::RedisCacheConfig;
use crate::key_render::{collection_pattern, generation_key, render_key};

/// Redis-backed implementation of [`CacheStore`].
///
/// Values are plain Redis strings written with `SET .. PX`, so expiry is
/// enforced by Redis itself. Collection invalidation walks the keyspace with
/// `SCAN MATCH` and removes hits with `UNLINK`, after an `INCR` of the
/// collection's generation counter. The counter has no expiry, so every
/// process sharing the prefix sees the same generation.
pub struct RedisCacheStore {
    pool: Pool,
    prefix: String,
    scan_batch: usize,
}

impl RedisCacheStore {
    /// Create a new `RedisCacheStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Configuration`] for an unusable key prefix and
    /// [`CacheError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| CacheError::Connection(e.to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
            scan_batch: config.scan_batch.max(1),
        })
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

/// TTL in milliseconds, never below 1 so that `PX` is always valid.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let redis_key = render_key(&self.prefix, key);
        let mut conn = self.conn().await?;

        let val: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(val)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let redis_key = render_key(&self.prefix, key);
        let mut conn = self.conn().await?;

        redis::cmd("SET")
            .arg(&redis_key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let redis_key = render_key(&self.prefix, key);
        let mut conn = self.conn().await?;

        let deleted: i64 = conn
            .del(&redis_key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(deleted > 0)
    }

    async fn generation(&self, collection: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn().await?;
        let generation: Option<u64> = conn
            .get(generation_key(&self.prefix, collection))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(generation.unwrap_or(0))
    }

    async fn invalidate_collection(&self, collection: &str) -> Result<u64, CacheError> {
        let pattern = collection_pattern(&self.prefix, collection);
        let mut conn = self.conn().await?;

        let generation: u64 = conn
            .incr(generation_key(&self.prefix, collection), 1u64)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let mut removed = 0u64;
        let mut cursor = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.scan_batch)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Backend(e.to_string()))?;

            if !keys.is_empty() {
                let unlinked: u64 = redis::cmd("UNLINK")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| CacheError::Backend(e.to_string()))?;
                removed += unlinked;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(collection, generation, removed, "redis collection invalidated");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_secs(2)), 2000);
    }

    #[test]
    fn new_rejects_glob_prefix() {
        let config = RedisCacheConfig {
            prefix: "quire*".to_owned(),
            ..RedisCacheConfig::default()
        };
        assert!(matches!(
            RedisCacheStore::new(&config),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn new_rejects_malformed_url() {
        let config = RedisCacheConfig {
            url: "not a url".to_owned(),
            ..RedisCacheConfig::default()
        };
        assert!(matches!(
            RedisCacheStore::new(&config),
            Err(CacheError::Connection(_))
        ));
    }
}
