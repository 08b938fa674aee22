/// Configuration for the Postgres audit store.
#[derive(Debug, Clone)]
pub struct PostgresAuditConfig {
    /// Postgres connection URL.
    pub url: String,
    /// Table name prefix (e.g. "quire_").
    pub prefix: String,
    /// Maximum number of connections in the pool.
    pub pool_size: u32,
}

impl PostgresAuditConfig {
    /// Create a new configuration with the given URL and defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: "quire_".to_owned(),
            pool_size: 5,
        }
    }

    /// Set the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Name of the audit table.
    pub fn table(&self) -> String {
        audit_table(&self.prefix)
    }
}

pub(crate) fn audit_table(prefix: &str) -> String {
    format!("{prefix}audit")
}
