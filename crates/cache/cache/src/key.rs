use serde::Serialize;
use sha2::{Digest, Sha256};

use quire_core::to_canonical_string;

use crate::error::CacheError;

/// Structured cache key: the collection and read operation that produced a
/// value, the collection generation it was read under, plus the canonical
/// encoding of the operation's parameters.
///
/// Two keys built from the same collection, operation, generation and
/// structurally equal parameters always render to the same string. A value
/// stored under an old generation is never found by a key built after the
/// collection was invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    collection: String,
    operation: String,
    generation: u64,
    params: String,
}

impl CacheKey {
    /// Build a key, canonicalizing `params` (object keys sorted).
    pub fn new<P: Serialize + ?Sized>(
        collection: impl Into<String>,
        operation: impl Into<String>,
        params: &P,
    ) -> Result<Self, CacheError> {
        let params =
            to_canonical_string(params).map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(Self {
            collection: collection.into(),
            operation: operation.into(),
            generation: 0,
            params,
        })
    }

    /// Pin the key to a collection generation, as returned by
    /// [`CacheStore::generation`](crate::CacheStore::generation).
    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Canonical JSON of the parameters.
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Hex SHA-256 of the canonical parameters. Keeps rendered keys bounded
    /// no matter how large the filter is.
    #[must_use]
    pub fn params_digest(&self) -> String {
        hex::encode(Sha256::digest(self.params.as_bytes()))
    }

    /// Return the opaque string form: `collection:operation:generation:digest`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{}{}:{}:{}",
            Self::collection_prefix(&self.collection),
            self.operation,
            self.generation,
            self.params_digest()
        )
    }

    /// Prefix shared by every rendered key of `collection`.
    #[must_use]
    pub fn collection_prefix(collection: &str) -> String {
        format!("{collection}:")
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identical_params_share_a_key() {
        let a = CacheKey::new("companies", "find_all", &json!({"page": 1, "limit": 10})).unwrap();
        let b = CacheKey::new("companies", "find_all", &json!({"limit": 10, "page": 1})).unwrap();
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a, b);
    }

    #[test]
    fn operation_and_collection_partition_keys() {
        let params = json!({"id": "x"});
        let a = CacheKey::new("companies", "find_by_id", &params).unwrap();
        let b = CacheKey::new("companies", "find_all", &params).unwrap();
        let c = CacheKey::new("contacts", "find_by_id", &params).unwrap();
        assert_ne!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), c.canonical());
    }

    #[test]
    fn canonical_layout() {
        let key = CacheKey::new("companies", "find_by_id", &json!({"id": "x"})).unwrap();
        let rendered = key.canonical();
        assert!(rendered.starts_with("companies:find_by_id:0:"));
        assert!(rendered.starts_with(&CacheKey::collection_prefix("companies")));
        assert_eq!(rendered.len(), "companies:find_by_id:0:".len() + 64);
        assert_eq!(key.params(), r#"{"id":"x"}"#);
    }

    #[test]
    fn generations_partition_keys() {
        let params = json!({"page": 1, "limit": 10});
        let old = CacheKey::new("companies", "find_all", &params).unwrap();
        let new = old.clone().with_generation(3);
        assert_eq!(new.generation(), 3);
        assert_ne!(old.canonical(), new.canonical());
        assert!(new.canonical().starts_with("companies:find_all:3:"));
        assert!(new.canonical().starts_with(&CacheKey::collection_prefix("companies")));
    }
}
