use super::*;

#[test]
fn empty_file_gives_defaults() {
    let config = QuireConfig::from_toml("").unwrap();
    assert!(config.cache.url.is_none());
    assert_eq!(config.cache.backend(), "memory");
    assert_eq!(config.cache.prefix, "quire");
    assert_eq!(config.cache.ttl_seconds, 300);
    assert_eq!(config.cache.pool_size, 10);
    assert_eq!(config.cache.connection_timeout_seconds, 5);
    assert_eq!(config.cache.sweep_interval_seconds, 60);
    assert_eq!(config.store.backend, "memory");
    assert_eq!(config.store.prefix, "quire_");
    assert_eq!(config.store.pool_size, 5);
    assert_eq!(config.audit.backend, "memory");
    assert!(!config.audit.redact.enabled);
    assert_eq!(config.audit.redact.placeholder, "[REDACTED]");
    assert_eq!(config.query.max_page_size, 1000);
    assert_eq!(config.telemetry.level, "info");
    assert_eq!(config.telemetry.format, LogFormat::Pretty);
}

#[test]
fn full_config() {
    let toml = r#"
        [cache]
        url = "redis://cache:6379"
        prefix = "crm"
        ttl_seconds = 60

        [store]
        backend = "postgres"
        url = "postgres://db/crm"
        prefix = "crm_"
        pool_size = 20
        ssl_mode = "require"

        [audit]
        backend = "postgres"
        url = "postgres://db/crm"

        [audit.redact]
        enabled = true
        fields = ["password", "billing.card_number"]
        placeholder = "***"

        [query]
        max_page_size = 200

        [telemetry]
        level = "quire=debug"
        format = "json"
    "#;

    let config = QuireConfig::from_toml(toml).unwrap();
    assert_eq!(config.cache.backend(), "redis");
    assert_eq!(config.cache.url.as_deref(), Some("redis://cache:6379"));
    assert_eq!(config.cache.prefix, "crm");
    assert_eq!(config.cache.ttl_seconds, 60);
    assert_eq!(config.cache.pool_size, 10);
    assert_eq!(config.store.backend, "postgres");
    assert_eq!(config.store.pool_size, 20);
    assert_eq!(config.store.ssl_mode.as_deref(), Some("require"));
    assert_eq!(config.audit.prefix, "quire_");
    assert!(config.audit.redact.enabled);
    assert_eq!(config.audit.redact.fields.len(), 2);
    assert_eq!(config.audit.redact.placeholder, "***");
    assert_eq!(config.query.max_page_size, 200);
    assert_eq!(config.telemetry.format, LogFormat::Json);
}

#[test]
fn unknown_format_is_rejected() {
    let err = QuireConfig::from_toml("[telemetry]\nformat = \"xml\"").unwrap_err();
    assert!(matches!(err, RuntimeError::Config(_)));
}

#[test]
fn missing_file_gives_defaults() {
    let config = QuireConfig::load(Path::new("/nonexistent/quire.toml")).unwrap();
    assert_eq!(config.store.backend, "memory");
}
