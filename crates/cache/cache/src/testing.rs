use std::time::Duration;

use serde_json::json;

use crate::error::CacheError;
use crate::key::CacheKey;
use crate::store::CacheStore;

const TTL: Duration = Duration::from_secs(3600);

fn test_key(collection: &str, operation: &str, id: &str) -> Result<CacheKey, CacheError> {
    CacheKey::new(collection, operation, &json!({ "id": id }))
}

/// Run the full cache store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if the backend reports one during any step.
pub async fn run_cache_conformance_tests(store: &dyn CacheStore) -> Result<(), CacheError> {
    test_get_missing(store).await?;
    test_set_and_get(store).await?;
    test_set_overwrites(store).await?;
    test_delete(store).await?;
    test_invalidate_collection(store).await?;
    test_invalidate_empty_collection(store).await?;
    test_invalidate_advances_generation(store).await?;
    test_stale_generation_is_unreachable(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn CacheStore) -> Result<(), CacheError> {
    let key = test_key("conf_missing", "find_by_id", "nope")?;
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn CacheStore) -> Result<(), CacheError> {
    let key = test_key("conf_set_get", "find_by_id", "a")?;
    store.set(&key, "hello", TTL).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("hello"));
    Ok(())
}

async fn test_set_overwrites(store: &dyn CacheStore) -> Result<(), CacheError> {
    let key = test_key("conf_overwrite", "find_by_id", "a")?;
    store.set(&key, "v1", TTL).await?;
    store.set(&key, "v2", TTL).await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v2"), "second set should win");
    Ok(())
}

async fn test_delete(store: &dyn CacheStore) -> Result<(), CacheError> {
    let key = test_key("conf_delete", "find_by_id", "a")?;
    store.set(&key, "bye", TTL).await?;
    let existed = store.delete(&key).await?;
    assert!(existed, "delete should return true for existing key");
    assert!(store.get(&key).await?.is_none(), "get after delete should return None");

    let existed = store.delete(&key).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}

async fn test_invalidate_collection(store: &dyn CacheStore) -> Result<(), CacheError> {
    let by_id = test_key("conf_inval", "find_by_id", "a")?;
    let page = CacheKey::new("conf_inval", "find_all", &json!({ "page": 1, "limit": 10 }))?;
    let other = test_key("conf_inval_other", "find_by_id", "a")?;

    store.set(&by_id, "entity", TTL).await?;
    store.set(&page, "page", TTL).await?;
    store.set(&other, "untouched", TTL).await?;

    let removed = store.invalidate_collection("conf_inval").await?;
    assert_eq!(removed, 2, "both entries of the collection should be removed");
    assert!(store.get(&by_id).await?.is_none());
    assert!(store.get(&page).await?.is_none());
    assert_eq!(
        store.get(&other).await?.as_deref(),
        Some("untouched"),
        "a collection sharing a name prefix must not be invalidated"
    );
    Ok(())
}

async fn test_invalidate_empty_collection(store: &dyn CacheStore) -> Result<(), CacheError> {
    let removed = store.invalidate_collection("conf_never_written").await?;
    assert_eq!(removed, 0);
    Ok(())
}

async fn test_invalidate_advances_generation(store: &dyn CacheStore) -> Result<(), CacheError> {
    let before = store.generation("conf_gen").await?;
    let untouched = store.generation("conf_gen_other").await?;

    store.invalidate_collection("conf_gen").await?;
    let after = store.generation("conf_gen").await?;
    assert!(after > before, "invalidation should advance the generation");

    store.invalidate_collection("conf_gen").await?;
    assert!(store.generation("conf_gen").await? > after);
    assert_eq!(
        store.generation("conf_gen_other").await?,
        untouched,
        "other collections keep their generation"
    );
    Ok(())
}

async fn test_stale_generation_is_unreachable(store: &dyn CacheStore) -> Result<(), CacheError> {
    let params = json!({ "page": 1, "limit": 10 });
    let seen = store.generation("conf_stale").await?;
    let stale = CacheKey::new("conf_stale", "find_all", &params)?.with_generation(seen);

    // A writer invalidates between the reader's generation read and its set.
    store.invalidate_collection("conf_stale").await?;
    store.set(&stale, "stale page", TTL).await?;

    let current = store.generation("conf_stale").await?;
    let fresh = CacheKey::new("conf_stale", "find_all", &params)?.with_generation(current);
    assert!(
        store.get(&fresh).await?.is_none(),
        "a value written under an old generation must not be served"
    );
    Ok(())
}
