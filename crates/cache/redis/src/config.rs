use std::time::Duration;

use quire_cache::CacheError;

/// Configuration for the Redis cache backend.
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379`).
    pub url: String,

    /// Key prefix applied to every Redis key to avoid collisions.
    ///
    /// Limited to ASCII letters, digits, `_`, `-` and `.` because it is
    /// embedded in `SCAN MATCH` patterns.
    pub prefix: String,

    /// Number of connections in the `deadpool-redis` pool.
    pub pool_size: usize,

    /// Timeout for acquiring a pooled connection.
    pub connection_timeout: Duration,

    /// `COUNT` hint for each `SCAN` step during collection invalidation.
    pub scan_batch: usize,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            prefix: String::from("quire"),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            scan_batch: 500,
        }
    }
}

impl RedisCacheConfig {
    /// Reject a prefix that would widen the invalidation pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Configuration`] for an empty prefix or one with
    /// characters outside `[A-Za-z0-9_.-]`, glob metacharacters included.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.prefix.is_empty() {
            return Err(CacheError::Configuration(
                "redis key prefix must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .prefix
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(CacheError::Configuration(format!(
                "redis key prefix {:?} contains {bad:?}",
                self.prefix
            )));
        }
        Ok(())
    }
}
