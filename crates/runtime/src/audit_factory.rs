use std::sync::Arc;

use quire_audit::{AuditStore, RedactConfig, RedactingAuditStore};
use quire_audit_memory::MemoryAuditStore;
#[cfg(feature = "postgres")]
use quire_audit_postgres::{PostgresAuditConfig, PostgresAuditStore};
use tracing::info;

use crate::config::AuditConfig;
use crate::error::RuntimeError;

/// Create an audit store from the given configuration.
#[allow(clippy::unused_async)]
pub async fn create_audit_store(config: &AuditConfig) -> Result<Arc<dyn AuditStore>, RuntimeError> {
    let store: Arc<dyn AuditStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryAuditStore::new()),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.url.as_deref().ok_or_else(|| {
                RuntimeError::Config("audit postgres backend requires [audit] url".into())
            })?;

            let pg_config = PostgresAuditConfig::new(url)
                .with_prefix(&config.prefix)
                .with_pool_size(config.pool_size);

            let store = PostgresAuditStore::new(&pg_config)
                .await
                .map_err(|e| RuntimeError::Config(format!("audit postgres: {e}")))?;

            Arc::new(store)
        }
        other => {
            return Err(RuntimeError::Config(format!(
                "unknown audit backend: {other} (is the feature enabled?)"
            )));
        }
    };
    info!(backend = %config.backend, "audit store initialized");

    // Wrap with redaction if enabled.
    if config.redact.enabled && !config.redact.fields.is_empty() {
        let redact_config = RedactConfig {
            fields: config.redact.fields.clone(),
            placeholder: config.redact.placeholder.clone(),
        };
        Ok(Arc::new(RedactingAuditStore::new(store, &redact_config)))
    } else {
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use quire_audit::{AuditChange, AuditQuery, AuditRecord};
    use quire_core::{EntityId, UserId};
    use serde_json::json;

    use super::*;
    use crate::config::AuditRedactConfig;

    #[tokio::test]
    async fn memory_with_redaction() {
        let config = AuditConfig {
            redact: AuditRedactConfig {
                enabled: true,
                fields: vec!["password".into()],
                ..AuditRedactConfig::default()
            },
            ..AuditConfig::default()
        };
        let store = create_audit_store(&config).await.unwrap();
        store
            .append(AuditRecord::new(
                AuditChange::Create {
                    new: json!({"id": "a1", "password": "hunter2"}),
                },
                "accounts",
                EntityId::new("a1"),
                UserId::new("admin"),
            ))
            .await
            .unwrap();

        let page = store.query(&AuditQuery::default()).await.unwrap();
        assert_eq!(
            page.records[0].new_data.as_ref().unwrap()["password"],
            "[REDACTED]"
        );
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let config = AuditConfig {
            backend: "clickhouse".into(),
            ..AuditConfig::default()
        };
        assert!(matches!(
            create_audit_store(&config).await,
            Err(RuntimeError::Config(_))
        ));
    }
}
