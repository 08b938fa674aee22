use std::sync::Arc;

use tracing::debug;

use quire_core::{EntityId, UserId};

use crate::error::AuditError;
use crate::record::{AuditChange, AuditPage, AuditQuery, AuditRecord};
use crate::store::AuditStore;

/// Front door to the audit log: stamps records and appends them to the
/// configured [`AuditStore`].
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn AuditStore>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Append one record describing `change` and return it.
    ///
    /// Only storage failures are reported; there is no business-rule
    /// rejection.
    pub async fn record(
        &self,
        change: AuditChange,
        entity_type: &str,
        entity_id: &EntityId,
        user_id: &UserId,
    ) -> Result<AuditRecord, AuditError> {
        let record = AuditRecord::new(change, entity_type, entity_id.clone(), user_id.clone());
        self.store.append(record.clone()).await?;
        debug!(
            audit.id = %record.id,
            action = %record.action,
            entity_type,
            entity.id = %entity_id,
            "audit record appended"
        );
        Ok(record)
    }

    /// History of one entity, newest first.
    pub async fn history(
        &self,
        entity_type: &str,
        entity_id: &EntityId,
        limit: u32,
        offset: u32,
    ) -> Result<AuditPage, AuditError> {
        let query = AuditQuery {
            limit: Some(limit),
            offset: Some(offset),
            ..AuditQuery::for_entity(entity_type, entity_id.clone())
        };
        self.store.query(&query).await
    }
}
