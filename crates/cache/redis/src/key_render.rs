use quire_cache::CacheKey;

/// Render a [`CacheKey`] into a Redis key string with the given prefix.
///
/// The format is `prefix:collection:operation:digest`.
pub fn render_key(prefix: &str, key: &CacheKey) -> String {
    format!("{prefix}:{}", key.canonical())
}

/// `SCAN MATCH` pattern covering every key of `collection`.
///
/// Collection names are restricted to `[A-Za-z0-9_]` and prefixes are
/// checked by [`RedisCacheConfig::validate`](crate::RedisCacheConfig::validate),
/// so neither carries glob metacharacters.
pub fn collection_pattern(prefix: &str, collection: &str) -> String {
    format!("{prefix}:{}*", CacheKey::collection_prefix(collection))
}

/// Counter key holding the generation of `collection`.
///
/// `#` never appears in a collection name, so the counter is outside every
/// [`collection_pattern`] and survives invalidation.
pub fn generation_key(prefix: &str, collection: &str) -> String {
    format!("{prefix}:#generation:{collection}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_prefixed_key() {
        let key = CacheKey::new("companies", "find_by_id", &json!({"id": "1"})).unwrap();
        let rendered = render_key("quire", &key);
        assert_eq!(rendered, format!("quire:{}", key.canonical()));
        assert!(rendered.starts_with("quire:companies:find_by_id:"));
    }

    #[test]
    fn pattern_matches_only_the_collection() {
        assert_eq!(collection_pattern("quire", "companies"), "quire:companies:*");
    }

    #[test]
    fn generation_key_is_outside_the_collection_pattern() {
        let counter = generation_key("quire", "companies");
        assert_eq!(counter, "quire:#generation:companies");
        assert!(!counter.starts_with("quire:companies:"));
    }
}
