use async_trait::async_trait;
use serde_json::{Map, Value};

use quire_core::{Entity, EntityId, Filter};

use crate::error::StoreError;
use crate::query::ListQuery;

/// Adapter over a single table or document collection.
///
/// One implementation instance serves one collection; there are no joins.
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Name of the collection this store serves.
    fn collection(&self) -> &str;

    /// Fetch one entity by primary key.
    async fn get(&self, id: &EntityId) -> Result<Option<Entity>, StoreError>;

    /// Run a bounded, sorted selection.
    async fn list(&self, query: &ListQuery) -> Result<Vec<Entity>, StoreError>;

    /// Count entities matching `filter`; `None` counts the whole collection.
    async fn count(&self, filter: Option<&Filter>) -> Result<u64, StoreError>;

    /// Insert a new entity. A string `"id"` in `data` is used as the key,
    /// otherwise one is generated.
    ///
    /// Returns [`StoreError::Conflict`] if the key is already taken.
    async fn insert(&self, data: Map<String, Value>) -> Result<Entity, StoreError>;

    /// Shallow-merge `patch` into an existing entity. Returns `None` if the
    /// entity does not exist.
    async fn update(
        &self,
        id: &EntityId,
        patch: Map<String, Value>,
    ) -> Result<Option<Entity>, StoreError>;

    /// Delete an entity. Returns `true` if it existed.
    async fn delete(&self, id: &EntityId) -> Result<bool, StoreError>;

    /// Whether an entity with this key exists.
    async fn exists(&self, id: &EntityId) -> Result<bool, StoreError>;
}

/// Split insert data into the key to use and the remaining fields.
///
/// A missing `"id"` yields a freshly generated key; a present one must be a
/// non-empty string.
pub fn prepare_insert(
    mut data: Map<String, Value>,
) -> Result<(EntityId, Map<String, Value>), StoreError> {
    let id = match data.remove(quire_core::ID_FIELD) {
        None => EntityId::generate(),
        Some(Value::String(id)) if !id.is_empty() => EntityId::new(id),
        Some(_) => {
            return Err(StoreError::Validation(
                quire_core::ValidationError::InvalidEntity(
                    "id must be a non-empty string".into(),
                ),
            ));
        }
    };
    Ok((id, data))
}
