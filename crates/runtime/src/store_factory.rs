use std::sync::Arc;

use dashmap::DashMap;
use quire_store::EntityStore;
use quire_store_memory::MemoryEntityStore;
#[cfg(feature = "postgres")]
use quire_store_postgres::{PostgresEntityStore, PostgresStoreConfig, connect_pool};
use tracing::info;

use crate::config::StoreConfig;
use crate::error::RuntimeError;

enum Backend {
    Memory,
    #[cfg(feature = "postgres")]
    Postgres { pool: sqlx::PgPool, prefix: String },
}

/// Opens entity stores for collections on one configured backend.
///
/// Backend connections (e.g. the Postgres pool) are shared by every store.
/// Each collection is opened once; later calls return the same store.
pub struct StoreFactory {
    backend: Backend,
    stores: DashMap<String, Arc<dyn EntityStore>>,
}

impl StoreFactory {
    /// Connect to the backend selected by `config`.
    #[allow(clippy::unused_async)]
    pub async fn new(config: &StoreConfig) -> Result<Self, RuntimeError> {
        let backend = match config.backend.as_str() {
            "memory" => Backend::Memory,
            #[cfg(feature = "postgres")]
            "postgres" => {
                let url = config.url.clone().ok_or_else(|| {
                    RuntimeError::Config("store postgres backend requires [store] url".into())
                })?;
                let pg_config = PostgresStoreConfig {
                    url,
                    pool_size: config.pool_size,
                    table_prefix: config.prefix.clone(),
                    ssl_mode: config.ssl_mode.clone(),
                    ssl_root_cert: config.ssl_root_cert.clone(),
                    ssl_cert: config.ssl_cert.clone(),
                    ssl_key: config.ssl_key.clone(),
                };
                let pool = connect_pool(&pg_config).await?;
                Backend::Postgres {
                    pool,
                    prefix: config.prefix.clone(),
                }
            }
            other => {
                return Err(RuntimeError::Config(format!(
                    "unknown store backend: {other} (is the feature enabled?)"
                )));
            }
        };
        info!(backend = %config.backend, "entity store backend initialized");

        Ok(Self {
            backend,
            stores: DashMap::new(),
        })
    }

    /// Name of the backend stores are opened on.
    pub fn backend(&self) -> &'static str {
        match self.backend {
            Backend::Memory => "memory",
            #[cfg(feature = "postgres")]
            Backend::Postgres { .. } => "postgres",
        }
    }

    /// The store for `collection`, opening it (and running migrations) on
    /// first use.
    #[allow(clippy::unused_async)]
    pub async fn open(&self, collection: &str) -> Result<Arc<dyn EntityStore>, RuntimeError> {
        if let Some(store) = self.stores.get(collection) {
            return Ok(Arc::clone(store.value()));
        }

        let store: Arc<dyn EntityStore> = match &self.backend {
            Backend::Memory => Arc::new(MemoryEntityStore::new(collection)?),
            #[cfg(feature = "postgres")]
            Backend::Postgres { pool, prefix } => {
                Arc::new(PostgresEntityStore::from_pool(pool.clone(), prefix, collection).await?)
            }
        };

        // Another task may have opened the same collection meanwhile; keep
        // whichever landed first.
        let entry = self
            .stores
            .entry(collection.to_owned())
            .or_insert(store);
        Ok(Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;

    #[tokio::test]
    async fn same_collection_same_store() {
        let factory = StoreFactory::new(&StoreConfig::default()).await.unwrap();
        assert_eq!(factory.backend(), "memory");

        let a = factory.open("companies").await.unwrap();
        let mut data = Map::new();
        data.insert("name".into(), json!("Acme"));
        let acme = a.insert(data).await.unwrap();

        let b = factory.open("companies").await.unwrap();
        assert!(b.exists(acme.id()).await.unwrap());

        let other = factory.open("contacts").await.unwrap();
        assert!(!other.exists(acme.id()).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_collection_is_rejected() {
        let factory = StoreFactory::new(&StoreConfig::default()).await.unwrap();
        assert!(matches!(
            factory.open("drop table").await,
            Err(RuntimeError::Store(_))
        ));
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let config = StoreConfig {
            backend: "mongo".into(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            StoreFactory::new(&config).await,
            Err(RuntimeError::Config(_))
        ));
    }
}
