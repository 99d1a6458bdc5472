use verity_core::config::VerityConfig;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = VerityConfig::from_toml("").unwrap();

    assert_eq!(config.storage.db_path, None);
    assert_eq!(config.storage.read_pool_size, 4);
    assert_eq!(config.storage.busy_timeout_ms, 5_000);

    assert!((config.index.min_similarity - 0.35).abs() < 1e-9);
    assert_eq!(config.index.dimensions, 256);

    assert!((config.shock.gamma - 0.7).abs() < 1e-9);
    assert_eq!(config.shock.max_depth, 4);

    assert!((config.propagation.alpha - 0.6).abs() < 1e-9);
    assert_eq!(config.propagation.max_iterations, 100);

    assert!((config.zone.lambda - 0.2).abs() < 1e-9);
    assert_eq!(config.zone.max_depth, 2);

    assert_eq!(config.event.inactivity_secs, 30);
    assert_eq!(config.event.stuck_claim_grace_secs, 300);

    assert_eq!(config.arbiter.llm_judge_url, None);
    assert_eq!(config.log_level, "info");
    assert_eq!(config.environment, "development");
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[storage]
db_path = "/custom/path.db"
read_pool_size = 8

[propagation]
max_iterations = 50
"#;
    let config = VerityConfig::from_toml(toml).unwrap();
    assert_eq!(config.storage.db_path.as_deref(), Some("/custom/path.db"));
    assert_eq!(config.storage.read_pool_size, 8);
    assert_eq!(config.storage.busy_timeout_ms, 5_000);
    assert_eq!(config.propagation.max_iterations, 50);
}

#[test]
fn apply_env_overlays_only_set_variables() {
    // SAFETY: tests run in a single process, but this test owns these keys
    // exclusively and clears them afterward.
    unsafe {
        std::env::set_var("LOG_LEVEL", "debug");
        std::env::remove_var("ENVIRONMENT");
    }
    let config = VerityConfig::default().apply_env();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.environment, "development");
    unsafe {
        std::env::remove_var("LOG_LEVEL");
    }
}

#[test]
fn cors_origins_parsed_from_comma_separated_env() {
    unsafe {
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://a.test, https://b.test");
    }
    let config = VerityConfig::default().apply_env();
    assert_eq!(
        config.cors_allowed_origins,
        vec!["https://a.test".to_string(), "https://b.test".to_string()]
    );
    unsafe {
        std::env::remove_var("CORS_ALLOWED_ORIGINS");
    }
}
