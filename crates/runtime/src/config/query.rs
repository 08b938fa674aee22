use serde::Deserialize;

use quire_store::DEFAULT_MAX_PAGE_SIZE;

/// Limits applied to paginated reads.
#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    /// Largest page any collection may serve.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_max_page_size() -> u32 {
    DEFAULT_MAX_PAGE_SIZE
}
