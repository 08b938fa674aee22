//! Tracing subscriber initialization.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, TelemetryConfig};
use crate::error::RuntimeError;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if the configured level
/// is not a valid filter or a subscriber is already installed.
pub fn init(config: &TelemetryConfig) -> Result<(), RuntimeError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| RuntimeError::Config(format!("invalid log level {:?}: {e}", config.level)))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };
    result.map_err(|e| RuntimeError::Config(format!("tracing init: {e}")))
}
