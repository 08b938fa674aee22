pub mod builder;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod repository;

pub use builder::{CrudOrchestratorBuilder, DEFAULT_CACHE_TTL, MAX_CACHE_TTL, MIN_CACHE_TTL};
pub use error::OrchestratorError;
pub use metrics::{MetricsSnapshot, OrchestratorMetrics};
pub use orchestrator::CrudOrchestrator;
pub use repository::{EntityModel, Repository};
