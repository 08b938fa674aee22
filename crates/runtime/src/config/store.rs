use serde::Deserialize;

/// Configuration for the entity store backend.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use: `"memory"` or `"postgres"`.
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Connection URL (used by `postgres`).
    pub url: Option<String>,
    /// Prefix for collection tables.
    #[serde(default = "default_store_prefix")]
    pub prefix: String,
    /// Connection pool size.
    #[serde(default = "default_store_pool_size")]
    pub pool_size: u32,

    // ---- Postgres SSL fields ----
    /// SSL mode for `PostgreSQL` connections.
    #[serde(default)]
    pub ssl_mode: Option<String>,

    /// Path to the CA certificate for `PostgreSQL` SSL verification.
    #[serde(default)]
    pub ssl_root_cert: Option<String>,

    /// Path to the client certificate for `PostgreSQL` mTLS.
    #[serde(default)]
    pub ssl_cert: Option<String>,

    /// Path to the client private key for `PostgreSQL` mTLS.
    #[serde(default)]
    pub ssl_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: None,
            prefix: default_store_prefix(),
            pool_size: default_store_pool_size(),
            ssl_mode: None,
            ssl_root_cert: None,
            ssl_cert: None,
            ssl_key: None,
        }
    }
}

fn default_store_backend() -> String {
    "memory".to_owned()
}

fn default_store_prefix() -> String {
    "quire_".to_owned()
}

fn default_store_pool_size() -> u32 {
    5
}
