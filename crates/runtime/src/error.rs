use thiserror::Error;

/// Errors raised while wiring up backends.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. reading the config file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache error: {0}")]
    Cache(#[from] quire_cache::CacheError),

    #[error("store error: {0}")]
    Store(#[from] quire_store::StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] quire_audit::AuditError),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] quire_orchestrator::OrchestratorError),
}
