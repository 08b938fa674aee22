use thiserror::Error;

use quire_audit::{AuditAction, AuditError};
use quire_core::{Entity, EntityId, ValidationError};
use quire_store::StoreError;

/// Errors returned by [`CrudOrchestrator`](crate::CrudOrchestrator).
///
/// Cache failures never appear here; the orchestrator logs them and carries
/// on as if the cache had missed.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request was malformed; no backend was touched.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The entity does not exist.
    #[error("{collection} entity not found: {id}")]
    NotFound { collection: String, id: EntityId },

    /// The entity store failed; nothing was committed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The mutation was committed but its audit record could not be written.
    ///
    /// `committed` holds what the call would otherwise have returned: the
    /// stored entity for creates and updates, the removed one for deletes.
    #[error("{action} of {entity_id} committed but audit write failed: {source}")]
    AuditWrite {
        action: AuditAction,
        entity_id: EntityId,
        committed: Box<Entity>,
        #[source]
        source: AuditError,
    },

    /// Reading audit history failed.
    #[error("audit query failed: {0}")]
    AuditQuery(#[source] AuditError),

    /// A value could not be converted to or from its JSON form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The orchestrator was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl OrchestratorError {
    /// Whether the store mutation behind this error was committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::AuditWrite { .. })
    }

    /// The committed entity carried by an [`AuditWrite`](Self::AuditWrite) error.
    pub fn into_committed(self) -> Option<Entity> {
        match self {
            Self::AuditWrite { committed, .. } => Some(*committed),
            _ => None,
        }
    }
}
