use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::key::CacheKey;

/// Key/value cache with per-entry TTL.
///
/// Keys are structured but backends only ever see [`CacheKey::canonical`].
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the value for a key. Returns `None` if absent or expired.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`, overwriting any previous value.
    async fn set(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete a key. Returns `true` if a live entry was removed.
    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Current generation of `collection`; `0` until it is first invalidated.
    ///
    /// Readers pin their keys to the generation seen before they query the
    /// store, so a value computed before an invalidation can never be served
    /// after it.
    async fn generation(&self, collection: &str) -> Result<u64, CacheError>;

    /// Advance the generation of `collection`, then drop every entry belonging
    /// to it, whatever its operation and parameters. Returns the number of
    /// entries removed.
    ///
    /// The generation counter lives outside the collection's key space and
    /// survives the invalidation. This may be expensive on some backends; it
    /// runs once per write.
    async fn invalidate_collection(&self, collection: &str) -> Result<u64, CacheError>;
}
