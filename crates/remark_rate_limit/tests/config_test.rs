//! Tests for layered configuration loading.

use remark_core::{ModelId, Provider};
use remark_rate_limit::RemarkConfig;
use std::io::Write;
use tempfile::Builder;

#[test]
fn test_load_bundled_defaults() {
    let config = RemarkConfig::load().unwrap();

    assert_eq!(config.governor.min_delay_ms, 500);
    assert_eq!(config.governor.success_threshold, 3);

    let google = config.provider(Provider::Google).unwrap();
    assert_eq!(google.default_rpm, Some(10));
    assert_eq!(google.known_good_model.as_deref(), Some("gemini-2.5-flash"));

    assert_eq!(config.orchestrator.max_retries_same_model, 1);
    assert!(config.orchestrator.cache_model_lists);
}

#[test]
fn test_bundled_model_overrides_drive_base_delay() {
    let config = RemarkConfig::load().unwrap();
    let delays = config.base_delays();

    // 5 rpm
    let pro: ModelId = "google:gemini-2.5-pro".parse().unwrap();
    assert_eq!(delays.for_model(&pro), 12_000);

    // Provider default of 10 rpm
    let flash: ModelId = "google:gemini-2.5-flash".parse().unwrap();
    assert_eq!(delays.for_model(&flash), 6_000);
}

#[test]
fn test_config_from_file() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[governor]
min_delay_ms = 750
default_rpm = 30

[providers.gemini]
default_rpm = 2

[[models]]
id = "openrouter:deepseek/deepseek-r1:free"
base_delay_ms = 9000

[orchestrator]
fallbacks = ["openai:gpt-4o-mini"]
max_retries_same_model = 2
"#
    )
    .unwrap();

    let config = RemarkConfig::from_file(temp_file.path()).unwrap();
    assert_eq!(config.governor.min_delay_ms, 750);
    // Unset constants keep their defaults
    assert_eq!(config.governor.retry_hint_buffer_ms, 500);
    assert_eq!(config.orchestrator.max_retries_same_model, 2);
    assert_eq!(
        config.orchestrator.fallbacks,
        vec!["openai:gpt-4o-mini".parse::<ModelId>().unwrap()]
    );

    let delays = config.base_delays();
    let deepseek: ModelId = "openrouter:deepseek/deepseek-r1:free".parse().unwrap();
    assert_eq!(delays.for_model(&deepseek), 9000);

    // "gemini" is accepted as an alias for the google provider
    let flash: ModelId = "google:gemini-2.5-flash".parse().unwrap();
    assert_eq!(delays.for_model(&flash), 30_000);

    let mini: ModelId = "openai:gpt-4o-mini".parse().unwrap();
    assert_eq!(delays.for_model(&mini), 2000);
}

#[test]
fn test_config_from_file_rejects_bad_fallback() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[orchestrator]
fallbacks = ["gpt-4o-mini"]
"#
    )
    .unwrap();

    assert!(RemarkConfig::from_file(temp_file.path()).is_err());
}

#[test]
fn test_config_from_file_rejects_out_of_range_governor() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[governor]
success_reduction_factor = 1.5
"#
    )
    .unwrap();

    assert!(RemarkConfig::from_file(temp_file.path()).is_err());
}

#[test]
fn test_explicit_store_path_wins() {
    let mut config = RemarkConfig::default();
    config.store.path = Some("/tmp/remark-test/delays.json".into());
    assert_eq!(
        config.store_path().unwrap(),
        std::path::PathBuf::from("/tmp/remark-test/delays.json")
    );
}
