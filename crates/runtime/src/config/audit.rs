use serde::Deserialize;

/// Configuration for the audit log.
#[derive(Debug, Deserialize)]
pub struct AuditConfig {
    /// Which backend to use: `"memory"` or `"postgres"`.
    #[serde(default = "default_audit_backend")]
    pub backend: String,
    /// Connection URL (used by `postgres`).
    pub url: Option<String>,
    /// Table prefix for the audit backend.
    #[serde(default = "default_audit_prefix")]
    pub prefix: String,
    /// Connection pool size.
    #[serde(default = "default_audit_pool_size")]
    pub pool_size: u32,
    /// Field redaction configuration.
    #[serde(default)]
    pub redact: AuditRedactConfig,
}

/// Configuration for redacting sensitive fields from audit snapshots.
#[derive(Debug, Deserialize)]
pub struct AuditRedactConfig {
    /// Whether field redaction is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// List of field names or paths to redact (case-insensitive).
    ///
    /// Supports nested paths using dot notation (e.g., `"billing.card_number"`).
    #[serde(default)]
    pub fields: Vec<String>,
    /// Placeholder text to replace redacted values with.
    #[serde(default = "default_redact_placeholder")]
    pub placeholder: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend: default_audit_backend(),
            url: None,
            prefix: default_audit_prefix(),
            pool_size: default_audit_pool_size(),
            redact: AuditRedactConfig::default(),
        }
    }
}

impl Default for AuditRedactConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            fields: Vec::new(),
            placeholder: default_redact_placeholder(),
        }
    }
}

fn default_audit_backend() -> String {
    "memory".to_owned()
}

fn default_audit_prefix() -> String {
    "quire_".to_owned()
}

fn default_audit_pool_size() -> u32 {
    5
}

fn default_redact_placeholder() -> String {
    "[REDACTED]".to_owned()
}
