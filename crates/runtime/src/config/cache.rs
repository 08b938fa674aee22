use serde::Deserialize;

/// Configuration for the read cache.
///
/// Setting `url` selects the Redis backend; without it an in-process cache is
/// used. The choice is made once at startup.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub url: Option<String>,
    /// Key prefix for Redis keys.
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    /// Lifetime of cached reads in seconds, bounded to one day.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Redis connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Timeout for acquiring a pooled Redis connection, in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    /// How often the in-process cache purges expired entries, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl CacheConfig {
    /// Name of the backend this configuration selects.
    pub fn backend(&self) -> &'static str {
        if self.url.is_some() { "redis" } else { "memory" }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            prefix: default_cache_prefix(),
            ttl_seconds: default_ttl_seconds(),
            pool_size: default_pool_size(),
            connection_timeout_seconds: default_connection_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_cache_prefix() -> String {
    "quire".to_owned()
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_pool_size() -> usize {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_sweep_interval() -> u64 {
    60
}
