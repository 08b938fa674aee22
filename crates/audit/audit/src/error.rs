use thiserror::Error;

/// Errors raised while appending to or reading the audit log.
///
/// There are no business-rule rejections; every variant is an I/O or
/// encoding failure.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store rejected or failed the operation.
    #[error("audit storage error: {0}")]
    Storage(String),

    /// A stored record could not be decoded (e.g. an unknown action).
    #[error("audit record decode error: {0}")]
    Serialization(String),
}
