use thiserror::Error;

/// Errors from cache backend operations.
///
/// The orchestrator never surfaces these to callers; a failing cache degrades
/// to an always-miss cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid cache configuration: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
