use std::sync::Arc;
use std::time::Duration;

use quire_audit::{AuditStore, AuditTrail};
use quire_cache::CacheStore;
use quire_store::{CollectionSchema, EntityStore, PaginatedQueryBuilder};

use crate::error::OrchestratorError;
use crate::metrics::OrchestratorMetrics;
use crate::orchestrator::CrudOrchestrator;

/// Default lifetime of cached read results.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Shortest TTL the orchestrator will hand to a cache backend.
pub const MIN_CACHE_TTL: Duration = Duration::from_secs(1);

/// Longest TTL the orchestrator will hand to a cache backend.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Fluent builder for constructing a [`CrudOrchestrator`].
///
/// An [`EntityStore`] and an audit store are required. Without a cache the
/// orchestrator reads straight from the store; without a schema the
/// collection is open (any field may be filtered or sorted on).
pub struct CrudOrchestratorBuilder {
    store: Option<Arc<dyn EntityStore>>,
    cache: Option<Arc<dyn CacheStore>>,
    audit: Option<AuditTrail>,
    schema: Option<CollectionSchema>,
    cache_ttl: Duration,
    metrics: Option<Arc<OrchestratorMetrics>>,
}

impl CrudOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            cache: None,
            audit: None,
            schema: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            metrics: None,
        }
    }

    /// Set the entity store for the collection.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the cache used for reads.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the audit store that write operations append to.
    #[must_use]
    pub fn audit(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(AuditTrail::new(store));
        self
    }

    /// Share an existing audit trail.
    #[must_use]
    pub fn audit_trail(mut self, trail: AuditTrail) -> Self {
        self.audit = Some(trail);
        self
    }

    /// Set the schema that read requests are validated against.
    #[must_use]
    pub fn schema(mut self, schema: CollectionSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the TTL for cached reads. Clamped to one second .. one day.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl.clamp(MIN_CACHE_TTL, MAX_CACHE_TTL);
        self
    }

    /// Share a metrics instance, e.g. across the orchestrators of one process.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<OrchestratorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Consume the builder and produce a [`CrudOrchestrator`].
    pub fn build(self) -> Result<CrudOrchestrator, OrchestratorError> {
        let store = self
            .store
            .ok_or_else(|| OrchestratorError::Configuration("entity store is required".into()))?;

        let audit = self
            .audit
            .ok_or_else(|| OrchestratorError::Configuration("audit store is required".into()))?;

        let schema = match self.schema {
            Some(schema) => schema,
            None => CollectionSchema::new(store.collection())
                .map_err(|e| OrchestratorError::Configuration(e.to_string()))?,
        };
        if schema.name() != store.collection() {
            return Err(OrchestratorError::Configuration(format!(
                "schema is for collection {:?} but the store serves {:?}",
                schema.name(),
                store.collection()
            )));
        }

        Ok(CrudOrchestrator {
            store,
            cache: self.cache,
            audit,
            queries: PaginatedQueryBuilder::new(schema),
            cache_ttl: self.cache_ttl,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

impl Default for CrudOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use quire_audit_memory::MemoryAuditStore;
    use quire_store_memory::MemoryEntityStore;

    use super::*;

    fn store(name: &str) -> Arc<dyn EntityStore> {
        Arc::new(MemoryEntityStore::new(name).unwrap())
    }

    #[test]
    fn store_is_required() {
        let err = CrudOrchestratorBuilder::new()
            .audit(Arc::new(MemoryAuditStore::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestratorError::Configuration(ref m) if m.contains("entity store")));
    }

    #[test]
    fn audit_is_required() {
        let err = CrudOrchestratorBuilder::new()
            .store(store("companies"))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestratorError::Configuration(ref m) if m.contains("audit")));
    }

    #[test]
    fn schema_must_match_store() {
        let err = CrudOrchestratorBuilder::new()
            .store(store("companies"))
            .audit(Arc::new(MemoryAuditStore::new()))
            .schema(CollectionSchema::new("contacts").unwrap())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }

    #[test]
    fn ttl_is_clamped() {
        let b = CrudOrchestratorBuilder::new().cache_ttl(Duration::ZERO);
        assert_eq!(b.cache_ttl, MIN_CACHE_TTL);
        let b = CrudOrchestratorBuilder::new().cache_ttl(Duration::from_secs(1_000_000));
        assert_eq!(b.cache_ttl, MAX_CACHE_TTL);
        assert_eq!(CrudOrchestratorBuilder::default().cache_ttl, DEFAULT_CACHE_TTL);
    }

    #[test]
    fn defaults_to_open_schema() {
        let orchestrator = CrudOrchestratorBuilder::new()
            .store(store("companies"))
            .audit(Arc::new(MemoryAuditStore::new()))
            .build()
            .unwrap();
        assert_eq!(orchestrator.collection(), "companies");
        assert!(orchestrator.schema().is_open());
        assert!(orchestrator.schema().is_known("employees"));
        assert!(orchestrator.schema().is_sortable("employees"));
    }
}
