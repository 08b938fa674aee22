//! Wiring for Quire deployments: configuration loading, backend selection
//! and orchestrator construction.

pub mod audit_factory;
pub mod cache_factory;
pub mod config;
pub mod error;
pub mod store_factory;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use quire_audit::AuditTrail;
use quire_cache::CacheStore;
use quire_orchestrator::{CrudOrchestrator, OrchestratorMetrics};
use quire_store::CollectionSchema;
use tokio_util::sync::CancellationToken;

use crate::config::QuireConfig;
use crate::error::RuntimeError;
use crate::store_factory::StoreFactory;

/// Backends built once at startup and shared by every collection.
pub struct Runtime {
    config: QuireConfig,
    cache: Arc<dyn CacheStore>,
    audit: AuditTrail,
    stores: StoreFactory,
    metrics: Arc<OrchestratorMetrics>,
    cancel: CancellationToken,
}

impl Runtime {
    /// Build every backend named by `config`.
    pub async fn new(config: QuireConfig) -> Result<Self, RuntimeError> {
        let cancel = CancellationToken::new();
        let cache = cache_factory::create_cache(&config.cache, &cancel)?;
        let audit = AuditTrail::new(audit_factory::create_audit_store(&config.audit).await?);
        let stores = StoreFactory::new(&config.store).await?;

        Ok(Self {
            config,
            cache,
            audit,
            stores,
            metrics: Arc::new(OrchestratorMetrics::default()),
            cancel,
        })
    }

    pub fn config(&self) -> &QuireConfig {
        &self.config
    }

    pub fn stores(&self) -> &StoreFactory {
        &self.stores
    }

    /// Counters shared by every orchestrator this runtime builds.
    pub fn metrics(&self) -> &Arc<OrchestratorMetrics> {
        &self.metrics
    }

    /// Build an orchestrator for the collection described by `schema`.
    ///
    /// The schema's page size is capped at `[query] max_page_size`.
    pub async fn orchestrator(
        &self,
        schema: CollectionSchema,
    ) -> Result<CrudOrchestrator, RuntimeError> {
        let store = self.stores.open(schema.name()).await?;
        let max_page_size = schema.max_page_size().min(self.config.query.max_page_size);

        Ok(CrudOrchestrator::builder()
            .store(store)
            .cache(Arc::clone(&self.cache))
            .audit_trail(self.audit.clone())
            .schema(schema.with_max_page_size(max_page_size))
            .cache_ttl(Duration::from_secs(self.config.cache.ttl_seconds))
            .metrics(Arc::clone(&self.metrics))
            .build()?)
    }

    /// Stop background tasks.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use quire_core::PageRequest;
    use serde_json::{Map, json};

    use super::*;

    #[tokio::test]
    async fn default_runtime_serves_collections() {
        let runtime = Runtime::new(QuireConfig::default()).await.unwrap();
        let companies = runtime
            .orchestrator(CollectionSchema::new("companies").unwrap())
            .await
            .unwrap();

        let mut data = Map::new();
        data.insert("name".into(), json!("Acme"));
        let acme = companies.create(data, Some("u1")).await.unwrap();

        // A second orchestrator for the same collection sees the same data.
        let again = runtime
            .orchestrator(CollectionSchema::new("companies").unwrap())
            .await
            .unwrap();
        assert_eq!(again.find_by_id(acme.id()).await.unwrap(), acme);
        assert_eq!(again.history(acme.id(), 10, 0).await.unwrap().total, 1);
        assert_eq!(runtime.metrics().snapshot().writes, 1);
        runtime.shutdown();
    }

    #[tokio::test]
    async fn page_size_is_capped_by_config() {
        let config = QuireConfig::from_toml("[query]\nmax_page_size = 50").unwrap();
        let runtime = Runtime::new(config).await.unwrap();
        let companies = runtime
            .orchestrator(CollectionSchema::new("companies").unwrap())
            .await
            .unwrap();
        assert_eq!(companies.schema().max_page_size(), 50);
        assert!(companies.find_all(&PageRequest::new(1, 51)).await.is_err());
        assert!(companies.find_all(&PageRequest::new(1, 50)).await.is_ok());
    }
}
