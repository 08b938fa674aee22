mod audit;
mod cache;
mod query;
mod store;
mod telemetry;

#[cfg(test)]
mod tests;

pub use audit::*;
pub use cache::*;
pub use query::*;
pub use store::*;
pub use telemetry::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::RuntimeError;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct QuireConfig {
    /// Read cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Entity store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Pagination limits.
    #[serde(default)]
    pub query: QueryConfig,
    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl QuireConfig {
    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, RuntimeError> {
        toml::from_str(contents).map_err(|e| RuntimeError::Config(e.to_string()))
    }
}
