//! Tests for credential validation.

mod test_utils;

use remark_core::{FailureClass, Provider};
use remark_error::ProviderErrorKind;
use remark_orchestrator::{CredentialValidator, ModelDirectory, ValidationOutcome};
use remark_rate_limit::{ProviderSettings, RateGovernor, RemarkConfig};
use std::sync::Arc;
use std::time::Duration;
use test_utils::{MockCatalog, MockResponse, ScriptedProvider, model};

const LITE: &str = "google:gemini-2.5-flash-lite";
const FLASH: &str = "google:gemini-2.5-flash";

fn config() -> RemarkConfig {
    let mut config = RemarkConfig::default();
    config.providers.insert(
        "google".to_string(),
        ProviderSettings {
            default_rpm: None,
            validation_model: Some("gemini-2.5-flash-lite".to_string()),
            known_good_model: Some("gemini-2.5-flash".to_string()),
        },
    );
    config.providers.insert(
        "openai".to_string(),
        ProviderSettings {
            validation_model: Some("gpt-4o-mini".to_string()),
            ..ProviderSettings::default()
        },
    );
    config
}

struct Harness {
    provider: Arc<ScriptedProvider>,
    governor: Arc<RateGovernor>,
    validator: CredentialValidator,
}

fn harness(provider: ScriptedProvider, catalog: Option<MockCatalog>) -> Harness {
    let config = config();
    let provider = Arc::new(provider);
    let governor = Arc::new(RateGovernor::in_memory(&config));
    let mut validator = CredentialValidator::new(governor.clone(), provider.clone(), &config);
    if let Some(catalog) = catalog {
        validator = validator.with_catalog(Arc::new(catalog));
    }
    Harness {
        provider,
        governor,
        validator,
    }
}

fn google_catalog(models: &[&str]) -> MockCatalog {
    MockCatalog::new().with_models(Provider::Google, models)
}

#[tokio::test(start_paused = true)]
async fn test_valid_key() -> anyhow::Result<()> {
    let h = harness(
        ScriptedProvider::new().script(&model(LITE), vec![MockResponse::ok("ok")]),
        Some(google_catalog(&[
            "models/gemini-2.5-flash-lite",
            "models/gemini-2.5-flash",
        ])),
    );

    let outcome = h.validator.validate(Provider::Google, None, None).await?;

    assert_eq!(
        outcome,
        ValidationOutcome::Valid {
            model_used: model(LITE),
            healed_from: None,
        }
    );
    assert!(outcome.is_valid());
    assert_eq!(outcome.guidance(), None);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_probe_is_invalid_without_generation() -> anyhow::Result<()> {
    let h = harness(
        ScriptedProvider::new().script(&model(LITE), vec![MockResponse::ok("ok")]),
        Some(MockCatalog::new().with_error(
            Provider::Google,
            ProviderErrorKind::Api {
                status: 400,
                message: "API key not valid. Please pass a valid API key.".to_string(),
            },
        )),
    );

    let outcome = h.validator.validate(Provider::Google, None, None).await?;

    assert!(matches!(outcome, ValidationOutcome::InvalidCredential { .. }));
    assert!(!outcome.is_valid());
    assert_eq!(h.provider.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_throttled_key_is_valid_with_warning() -> anyhow::Result<()> {
    let h = harness(
        ScriptedProvider::new().script(
            &model(LITE),
            vec![MockResponse::http(429, "Resource has been exhausted (e.g. check quota).")],
        ),
        Some(google_catalog(&["models/gemini-2.5-flash-lite"])),
    );

    let outcome = h.validator.validate(Provider::Google, None, None).await?;

    assert!(matches!(outcome, ValidationOutcome::QuotaLimited { .. }));
    assert!(outcome.is_valid());
    assert!(outcome.guidance().is_some());
    // Still a throttling signal for the governor
    assert_eq!(
        h.governor.current_delay(&model(LITE)),
        Duration::from_millis(8000)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unknown_model_heals_to_known_good() -> anyhow::Result<()> {
    let h = harness(
        ScriptedProvider::new()
            .script(
                &model(LITE),
                vec![MockResponse::http(
                    404,
                    "models/gemini-2.5-flash-lite is not found for API version v1beta",
                )],
            )
            .script(&model(FLASH), vec![MockResponse::ok("ok")]),
        Some(google_catalog(&["models/gemini-2.5-flash"])),
    );

    let outcome = h.validator.validate(Provider::Google, None, None).await?;

    assert_eq!(
        outcome,
        ValidationOutcome::Valid {
            model_used: model(FLASH),
            healed_from: Some(model(LITE)),
        }
    );
    assert!(outcome.guidance().is_some());
    assert_eq!(h.provider.calls(), vec![model(LITE), model(FLASH)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_heal_refused_when_known_good_is_not_listed() -> anyhow::Result<()> {
    let h = harness(
        ScriptedProvider::new().script(
            &model(LITE),
            vec![MockResponse::http(429, "quota exceeded")],
        ),
        Some(google_catalog(&["models/gemini-2.5-pro"])),
    );

    let outcome = h.validator.validate(Provider::Google, None, None).await?;

    assert_eq!(
        outcome,
        ValidationOutcome::ModelUnavailable {
            requested: model(LITE),
            available: vec!["models/gemini-2.5-pro".to_string()],
        }
    );
    // Only the original attempt; no guessing
    assert_eq!(h.provider.call_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_heal_is_attempted_only_once() -> anyhow::Result<()> {
    let not_found = "HTTP 404: model not found";
    let h = harness(
        ScriptedProvider::new()
            .script(&model(LITE), vec![MockResponse::http(404, not_found)])
            .script(&model(FLASH), vec![MockResponse::http(404, not_found)]),
        None,
    );

    let outcome = h.validator.validate(Provider::Google, None, None).await?;

    assert_eq!(
        outcome,
        ValidationOutcome::ModelUnavailable {
            requested: model(LITE),
            available: Vec::new(),
        }
    );
    assert_eq!(h.provider.call_count(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_listing_skips_probe() -> anyhow::Result<()> {
    let mini = model("openai:gpt-4o-mini");
    let h = harness(
        ScriptedProvider::new().script(&mini, vec![MockResponse::ok("ok")]),
        Some(google_catalog(&["models/gemini-2.5-flash"])),
    );

    let outcome = h.validator.validate(Provider::OpenAi, None, None).await?;

    assert!(matches!(outcome, ValidationOutcome::Valid { .. }));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_generation_auth_failure_is_invalid() -> anyhow::Result<()> {
    let mini = model("openai:gpt-4o-mini");
    let h = harness(
        ScriptedProvider::new().script(
            &mini,
            vec![MockResponse::http(401, "Incorrect API key provided")],
        ),
        None,
    );

    let outcome = h.validator.validate(Provider::OpenAi, None, None).await?;

    assert!(matches!(outcome, ValidationOutcome::InvalidCredential { .. }));
    assert_eq!(
        outcome.guidance(),
        Some(FailureClass::InvalidCredential.guidance())
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_explicit_model_overrides_configuration() -> anyhow::Result<()> {
    let pro = model("google:gemini-2.5-pro");
    let h = harness(
        ScriptedProvider::new().script(&pro, vec![MockResponse::ok("ok")]),
        None,
    );

    let outcome = h
        .validator
        .validate(Provider::Google, Some("gemini-2.5-pro"), None)
        .await?;

    assert_eq!(
        outcome,
        ValidationOutcome::Valid {
            model_used: pro,
            healed_from: None,
        }
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_built_in_models_used_without_provider_settings() -> anyhow::Result<()> {
    let config = RemarkConfig::default();
    assert!(config.providers.is_empty());
    let provider = Arc::new(
        ScriptedProvider::new()
            .script(
                &model(LITE),
                vec![MockResponse::http(
                    404,
                    "models/gemini-2.5-flash-lite is not found for API version v1beta",
                )],
            )
            .script(&model(FLASH), vec![MockResponse::ok("ok")]),
    );
    let governor = Arc::new(RateGovernor::in_memory(&config));
    let validator = CredentialValidator::new(governor, provider.clone(), &config);

    let outcome = validator.validate(Provider::Google, None, None).await?;

    assert_eq!(
        outcome,
        ValidationOutcome::Valid {
            model_used: model(FLASH),
            healed_from: Some(model(LITE)),
        }
    );
    assert_eq!(provider.calls(), vec![model(LITE), model(FLASH)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_configured_models_override_built_in_ones() -> anyhow::Result<()> {
    let mut config = RemarkConfig::default();
    config.providers.insert(
        "openrouter".to_string(),
        ProviderSettings {
            validation_model: Some("mistralai/mistral-7b-instruct:free".to_string()),
            ..ProviderSettings::default()
        },
    );
    let custom = model("openrouter:mistralai/mistral-7b-instruct:free");
    let built_in = model("openrouter:meta-llama/llama-3.3-70b-instruct:free");
    let provider = Arc::new(
        ScriptedProvider::new()
            .script(
                &custom,
                vec![MockResponse::http(404, "No endpoints found for model")],
            )
            .script(&built_in, vec![MockResponse::ok("ok")]),
    );
    let governor = Arc::new(RateGovernor::in_memory(&config));
    let validator = CredentialValidator::new(governor, provider.clone(), &config);

    let outcome = validator.validate(Provider::OpenRouter, None, None).await?;

    // No known-good override, so healing lands on the built-in model
    assert_eq!(
        outcome,
        ValidationOutcome::Valid {
            model_used: built_in.clone(),
            healed_from: Some(custom.clone()),
        }
    );
    assert_eq!(provider.calls(), vec![custom, built_in]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_probe_results_are_shared_with_directory() -> anyhow::Result<()> {
    let config = config();
    let provider = Arc::new(ScriptedProvider::new().script(&model(LITE), vec![MockResponse::ok("ok")]));
    let governor = Arc::new(RateGovernor::in_memory(&config));
    let directory = Arc::new(ModelDirectory::new(None, true));
    let validator = CredentialValidator::new(governor, provider, &config)
        .with_catalog(Arc::new(google_catalog(&["models/gemini-2.5-flash-lite"])))
        .with_directory(directory.clone());

    validator.validate(Provider::Google, None, None).await?;

    assert!(directory.is_confirmed(&model(LITE)));
    // The probe's list is served from the directory without a catalog
    let cached = directory.available(Provider::Google).await.unwrap();
    assert_eq!(&*cached, ["models/gemini-2.5-flash-lite".to_string()]);
    Ok(())
}
