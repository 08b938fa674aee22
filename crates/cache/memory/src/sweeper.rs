use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::MemoryCacheStore;

/// Spawn a background task that periodically purges expired cache entries.
///
/// Expiry is already enforced on read; the sweep only reclaims memory held by
/// entries nobody reads again. The task stops when `cancel` fires.
pub fn spawn_sweeper(
    store: Arc<MemoryCacheStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so we don't sweep
        // an empty cache at startup.
        timer.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = timer.tick() => {
                    let removed = store.purge_expired();
                    if removed > 0 {
                        debug!(removed, "cache sweep removed expired entries");
                    }
                }
            }
        }
    })
}
