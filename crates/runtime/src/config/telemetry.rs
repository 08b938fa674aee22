use serde::Deserialize;

/// Log output configuration.
///
/// # Example
///
/// ```toml
/// [telemetry]
/// level = "quire=debug,info"
/// format = "json"
/// ```
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive.
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// How log lines are rendered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_owned()
}
