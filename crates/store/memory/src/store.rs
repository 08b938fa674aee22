use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use serde_json::{Map, Value};

use quire_core::{Entity, EntityId, Filter, validate_collection_name};
use quire_store::error::StoreError;
use quire_store::eval::{compare_entities, matches_opt};
use quire_store::query::ListQuery;
use quire_store::store::{EntityStore, prepare_insert};

#[derive(Debug, Clone)]
struct Row {
    seq: u64,
    entity: Entity,
}

/// In-memory [`EntityStore`] backed by a [`DashMap`]. Suitable for
/// development and testing.
///
/// Every insert draws a sequence number from a shared counter; that number
/// is the collection's creation order.
pub struct MemoryEntityStore {
    collection: String,
    rows: DashMap<EntityId, Row>,
    next_seq: AtomicU64,
}

impl MemoryEntityStore {
    /// Create an empty store for `collection`.
    pub fn new(collection: impl Into<String>) -> Result<Self, StoreError> {
        let collection = collection.into();
        validate_collection_name(&collection)?;
        Ok(Self {
            collection,
            rows: DashMap::new(),
            next_seq: AtomicU64::new(1),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Matching rows in no particular order.
    fn matching(&self, filter: Option<&Filter>) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| matches_opt(filter, &row.entity))
            .map(|row| row.value().clone())
            .collect()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn get(&self, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.rows.get(id).map(|row| row.entity.clone()))
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Entity>, StoreError> {
        let mut rows = self.matching(query.filter.as_ref());
        rows.sort_by(|a, b| compare_entities(&query.sort, (&a.entity, a.seq), (&b.entity, b.seq)));

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row.entity)
            .collect())
    }

    async fn count(&self, filter: Option<&Filter>) -> Result<u64, StoreError> {
        let count = self
            .rows
            .iter()
            .filter(|row| matches_opt(filter, &row.entity))
            .count();
        Ok(count as u64)
    }

    async fn insert(&self, data: Map<String, Value>) -> Result<Entity, StoreError> {
        let (id, fields) = prepare_insert(data)?;
        match self.rows.entry(id.clone()) {
            MapEntry::Occupied(_) => Err(StoreError::Conflict(id.to_string())),
            MapEntry::Vacant(slot) => {
                let entity = Entity::new(id, fields);
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(Row {
                    seq,
                    entity: entity.clone(),
                });
                Ok(entity)
            }
        }
    }

    async fn update(
        &self,
        id: &EntityId,
        patch: Map<String, Value>,
    ) -> Result<Option<Entity>, StoreError> {
        Ok(self.rows.get_mut(id).map(|mut row| {
            row.entity.apply_patch(&patch);
            row.entity.clone()
        }))
    }

    async fn delete(&self, id: &EntityId) -> Result<bool, StoreError> {
        Ok(self.rows.remove(id).is_some())
    }

    async fn exists(&self, id: &EntityId) -> Result<bool, StoreError> {
        Ok(self.rows.contains_key(id))
    }
}
