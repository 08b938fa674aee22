use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};

use quire_audit::{AuditChange, AuditPage, AuditTrail};
use quire_cache::{CacheKey, CacheStore};
use quire_core::{
    ACTIVE_FIELD, Entity, EntityId, PageRequest, PageResult, UserId, ensure_key_untouched,
};
use quire_store::{CollectionSchema, EntityStore, PaginatedQueryBuilder};

use crate::builder::CrudOrchestratorBuilder;
use crate::error::OrchestratorError;
use crate::metrics::OrchestratorMetrics;

const FIND_ALL: &str = "find_all";
const FIND_BY_ID: &str = "find_by_id";

/// Cache-aside CRUD front end for one collection.
///
/// Reads consult the cache first and populate it on a miss. Writes go to the
/// entity store, then drop every cached read of the collection, then append
/// an audit record when the caller identified themselves. The cache is
/// fail-open: any cache error is logged and treated as a miss.
///
/// Cache keys carry the collection generation read before the store is
/// queried. A read that raced a write stores its result under the old
/// generation, where no later read looks.
///
/// The orchestrator holds no locks across backend calls and is safe to share
/// between tasks behind an `Arc`.
pub struct CrudOrchestrator {
    pub(crate) store: Arc<dyn EntityStore>,
    pub(crate) cache: Option<Arc<dyn CacheStore>>,
    pub(crate) audit: AuditTrail,
    pub(crate) queries: PaginatedQueryBuilder,
    pub(crate) cache_ttl: Duration,
    pub(crate) metrics: Arc<OrchestratorMetrics>,
}

impl CrudOrchestrator {
    /// Start building an orchestrator.
    pub fn builder() -> CrudOrchestratorBuilder {
        CrudOrchestratorBuilder::new()
    }

    /// Name of the collection this orchestrator serves.
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    pub fn schema(&self) -> &CollectionSchema {
        self.queries.schema()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn metrics(&self) -> &Arc<OrchestratorMetrics> {
        &self.metrics
    }

    /// Return one page of the collection.
    ///
    /// The request is validated before any backend is touched.
    #[instrument(
        name = "orchestrator.find_all",
        skip(self, request),
        fields(collection = %self.collection(), page = request.page(), limit = request.limit())
    )]
    pub async fn find_all(
        &self,
        request: &PageRequest,
    ) -> Result<PageResult<Entity>, OrchestratorError> {
        let query = self.queries.build(request)?;
        self.metrics.increment_reads();

        let key = self.cache_key(FIND_ALL, request).await;
        if let Some(page) = self.cache_get::<PageResult<Entity>>(key.as_ref()).await {
            return Ok(page);
        }

        let total = self.store.count(query.count_filter()).await?;
        let items = self.store.list(query.list()).await?;
        let page = PageResult::new(query.page(), query.limit(), total, items);

        self.cache_put(key.as_ref(), &page).await;
        Ok(page)
    }

    /// Fetch one entity, or [`OrchestratorError::NotFound`].
    ///
    /// Misses are not cached, so an entity created later is seen immediately.
    #[instrument(
        name = "orchestrator.find_by_id",
        skip(self, id),
        fields(collection = %self.collection(), entity.id = %id)
    )]
    pub async fn find_by_id(&self, id: &EntityId) -> Result<Entity, OrchestratorError> {
        self.metrics.increment_reads();
        self.load(id).await
    }

    /// Whether the entity exists. Always asks the store.
    #[instrument(
        name = "orchestrator.exists",
        skip(self, id),
        fields(collection = %self.collection(), entity.id = %id)
    )]
    pub async fn exists(&self, id: &EntityId) -> Result<bool, OrchestratorError> {
        Ok(self.store.exists(id).await?)
    }

    /// Insert a new entity.
    ///
    /// A string `"id"` in `data` is used as the key; otherwise one is
    /// generated. When `user_id` is a non-empty identity a `create` audit
    /// record is appended.
    #[instrument(
        name = "orchestrator.create",
        skip(self, data, user_id),
        fields(collection = %self.collection())
    )]
    pub async fn create(
        &self,
        data: Map<String, Value>,
        user_id: Option<&str>,
    ) -> Result<Entity, OrchestratorError> {
        let created = self.store.insert(data).await?;
        self.committed().await;

        let change = AuditChange::Create {
            new: created.to_value(),
        };
        self.audit(change, created, user_id).await
    }

    /// Shallow-merge `data` into an existing entity.
    ///
    /// The key cannot be changed. The prior state is read through the cache
    /// and becomes the audit record's `old_data`.
    #[instrument(
        name = "orchestrator.update",
        skip(self, id, data, user_id),
        fields(collection = %self.collection(), entity.id = %id)
    )]
    pub async fn update(
        &self,
        id: &EntityId,
        data: Map<String, Value>,
        user_id: Option<&str>,
    ) -> Result<Entity, OrchestratorError> {
        ensure_key_untouched(&data)?;
        let old = self.load(id).await?;

        let updated = self
            .store
            .update(id, data)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        self.committed().await;

        let change = AuditChange::Update {
            old: old.to_value(),
            new: updated.to_value(),
        };
        self.audit(change, updated, user_id).await
    }

    /// Remove an entity and return it as it was before deletion.
    #[instrument(
        name = "orchestrator.delete",
        skip(self, id, user_id),
        fields(collection = %self.collection(), entity.id = %id)
    )]
    pub async fn delete(
        &self,
        id: &EntityId,
        user_id: Option<&str>,
    ) -> Result<Entity, OrchestratorError> {
        let old = self.load(id).await?;

        if !self.store.delete(id).await? {
            return Err(self.not_found(id));
        }
        self.committed().await;

        let change = AuditChange::Delete {
            old: old.to_value(),
        };
        self.audit(change, old, user_id).await
    }

    /// Mark an entity inactive. Goes through [`update`](Self::update), so it
    /// is cached, invalidated and audited the same way.
    pub async fn soft_delete(
        &self,
        id: &EntityId,
        user_id: Option<&str>,
    ) -> Result<Entity, OrchestratorError> {
        let mut patch = Map::new();
        patch.insert(ACTIVE_FIELD.to_owned(), Value::Bool(false));
        self.update(id, patch, user_id).await
    }

    /// Audit history of one entity, newest first.
    pub async fn history(
        &self,
        id: &EntityId,
        limit: u32,
        offset: u32,
    ) -> Result<AuditPage, OrchestratorError> {
        self.audit
            .history(self.collection(), id, limit, offset)
            .await
            .map_err(OrchestratorError::AuditQuery)
    }

    async fn load(&self, id: &EntityId) -> Result<Entity, OrchestratorError> {
        let key = self.cache_key(FIND_BY_ID, &json!({ "id": id })).await;
        if let Some(entity) = self.cache_get::<Entity>(key.as_ref()).await {
            return Ok(entity);
        }

        let entity = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| self.not_found(id))?;

        self.cache_put(key.as_ref(), &entity).await;
        Ok(entity)
    }

    fn not_found(&self, id: &EntityId) -> OrchestratorError {
        OrchestratorError::NotFound {
            collection: self.collection().to_owned(),
            id: id.clone(),
        }
    }

    /// Key for a read about to happen, pinned to the current generation.
    /// `None` bypasses the cache for this read.
    async fn cache_key<P: Serialize + ?Sized>(
        &self,
        operation: &str,
        params: &P,
    ) -> Option<CacheKey> {
        let cache = self.cache.as_ref()?;
        let generation = match cache.generation(self.collection()).await {
            Ok(generation) => generation,
            Err(e) => {
                self.metrics.increment_cache_errors();
                warn!(error = %e, operation, "cache generation unavailable, bypassing cache");
                return None;
            }
        };

        match CacheKey::new(self.collection(), operation, params) {
            Ok(key) => Some(key.with_generation(generation)),
            Err(e) => {
                self.metrics.increment_cache_errors();
                warn!(error = %e, operation, "failed to build cache key");
                None
            }
        }
    }

    /// Look up a cached value. Errors and undecodable payloads count as misses.
    async fn cache_get<T: DeserializeOwned>(&self, key: Option<&CacheKey>) -> Option<T> {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            self.metrics.increment_cache_misses();
            return None;
        };

        let raw = match cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.metrics.increment_cache_misses();
                debug!(key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                self.metrics.increment_cache_errors();
                self.metrics.increment_cache_misses();
                warn!(error = %e, key = %key, "cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.metrics.increment_cache_hits();
                debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                self.metrics.increment_cache_misses();
                warn!(error = %e, key = %key, "discarding undecodable cache entry");
                if let Err(e) = cache.delete(key).await {
                    self.metrics.increment_cache_errors();
                    warn!(error = %e, key = %key, "failed to delete undecodable cache entry");
                }
                None
            }
        }
    }

    async fn cache_put<T: Serialize>(&self, key: Option<&CacheKey>, value: &T) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                self.metrics.increment_cache_errors();
                warn!(error = %e, key = %key, "failed to encode value for cache");
                return;
            }
        };

        if let Err(e) = cache.set(key, &raw, self.cache_ttl).await {
            self.metrics.increment_cache_errors();
            warn!(error = %e, key = %key, "cache write failed");
        }
    }

    /// Bookkeeping after a store mutation has been committed: count it and
    /// drop every cached read of the collection.
    async fn committed(&self) {
        self.metrics.increment_writes();
        let Some(cache) = self.cache.as_ref() else {
            return;
        };

        self.metrics.increment_invalidations();
        match cache.invalidate_collection(self.collection()).await {
            Ok(removed) => debug!(removed, "collection cache invalidated"),
            Err(e) => {
                self.metrics.increment_cache_errors();
                warn!(error = %e, "cache invalidation failed, stale reads possible until TTL");
            }
        }
    }

    /// Append the audit record for a committed mutation, if the caller is
    /// identified, and hand back `committed`.
    async fn audit(
        &self,
        change: AuditChange,
        committed: Entity,
        user_id: Option<&str>,
    ) -> Result<Entity, OrchestratorError> {
        let Some(user_id) = UserId::from_optional(user_id) else {
            return Ok(committed);
        };

        let action = change.action();
        match self
            .audit
            .record(change, self.collection(), committed.id(), &user_id)
            .await
        {
            Ok(_) => {
                self.metrics.increment_audit_records();
                Ok(committed)
            }
            Err(source) => {
                self.metrics.increment_audit_failures();
                warn!(
                    error = %source,
                    action = %action,
                    entity.id = %committed.id(),
                    "audit write failed after commit"
                );
                Err(OrchestratorError::AuditWrite {
                    action,
                    entity_id: committed.id().clone(),
                    committed: Box::new(committed),
                    source,
                })
            }
        }
    }
}
