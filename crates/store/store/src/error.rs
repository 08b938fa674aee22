use quire_core::ValidationError;

/// Errors that can occur during entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish or maintain a connection to the backend.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// An entity with the same primary key already exists.
    #[error("entity already exists: {0}")]
    Conflict(String),

    /// A row could not be converted to or from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The data handed to the store is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store was configured with an unusable setting.
    #[error("configuration error: {0}")]
    Configuration(String),
}
