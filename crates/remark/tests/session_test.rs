//! End-to-end tests for the `Remark` session facade.

use async_trait::async_trait;
use remark::{
    CallOptions, CallResponse, FailureClass, ModelCatalog, ModelId, Provider, ProviderCall,
    ProviderError, ProviderResult, ProviderSettings, RateGovernor, Remark, RemarkConfig,
    ValidationOutcome,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Adapter that lists a fixed set of Gemini models and answers every call
/// with the next scripted result.
struct FakeGemini {
    models: Vec<String>,
    responses: Mutex<Vec<ProviderResult<CallResponse>>>,
    listings: Mutex<usize>,
}

impl FakeGemini {
    fn new(responses: Vec<ProviderResult<CallResponse>>) -> Self {
        Self {
            models: vec![
                "models/gemini-2.5-flash".to_string(),
                "models/gemini-2.5-flash-lite".to_string(),
            ],
            responses: Mutex::new(responses.into_iter().rev().collect()),
            listings: Mutex::new(0),
        }
    }

    fn listings(&self) -> usize {
        *self.listings.lock().unwrap()
    }
}

#[async_trait]
impl ProviderCall for FakeGemini {
    async fn call(
        &self,
        _model: &ModelId,
        _prompt: &str,
        _options: &CallOptions,
    ) -> ProviderResult<CallResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(ProviderError::request("script exhausted")))
    }
}

#[async_trait]
impl ModelCatalog for FakeGemini {
    async fn list_models(&self, _provider: Provider) -> ProviderResult<Vec<String>> {
        *self.listings.lock().unwrap() += 1;
        Ok(self.models.clone())
    }
}

fn config() -> RemarkConfig {
    let mut config = RemarkConfig::default();
    config.providers.insert(
        "google".to_string(),
        ProviderSettings {
            default_rpm: Some(30),
            validation_model: Some("gemini-2.5-flash-lite".to_string()),
            known_good_model: Some("gemini-2.5-flash".to_string()),
        },
    );
    config
}

fn session(adapter: &Arc<FakeGemini>) -> Remark {
    let config = config();
    let governor = Arc::new(RateGovernor::in_memory(&config));
    Remark::with_governor(config, governor, adapter.clone(), Some(adapter.clone()))
}

#[tokio::test(start_paused = true)]
async fn test_validation_probe_feeds_generation() -> anyhow::Result<()> {
    let adapter = Arc::new(FakeGemini::new(vec![
        Ok(CallResponse::new("ok")),
        Err(ProviderError::api(429, "Too Many Requests")),
        Err(ProviderError::api(429, "Too Many Requests")),
    ]));
    let remark = session(&adapter);

    let outcome = remark.validate(Provider::Google, None, None).await?;
    assert!(matches!(outcome, ValidationOutcome::Valid { .. }));
    assert_eq!(adapter.listings(), 1);

    let flash: ModelId = "google:gemini-2.5-flash".parse()?;
    let err = remark
        .generate(&flash, "prompt", &CallOptions::default(), None, None)
        .await
        .unwrap_err();

    // The probe's list confirmed the model: no second listing needed
    assert_eq!(err.failure_class(), Some(FailureClass::RateLimited));
    assert_eq!(adapter.listings(), 1);
    // 30 rpm gives a 2000ms base, doubled twice
    assert_eq!(
        remark.governor().current_delay(&flash),
        Duration::from_millis(8000)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_credential_change_forgets_models() -> anyhow::Result<()> {
    let adapter = Arc::new(FakeGemini::new(vec![
        Ok(CallResponse::new("ok")),
        Err(ProviderError::api(429, "quota")),
        Err(ProviderError::api(429, "quota")),
    ]));
    let remark = session(&adapter);

    remark.validate(Provider::Google, None, None).await?;
    remark.credential_changed(Provider::Google);

    let flash: ModelId = "google:gemini-2.5-flash".parse()?;
    let _ = remark
        .generate(&flash, "prompt", &CallOptions::default(), None, None)
        .await;

    assert_eq!(adapter.listings(), 2);
    Ok(())
}

#[test]
fn test_open_governor_persists_to_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.store.path = Some(dir.path().join("delays.json"));
    let flash: ModelId = "google:gemini-2.5-flash".parse().unwrap();

    let governor = Remark::open_governor(&config);
    governor.mark_throttled(&flash, None);

    let reopened = Remark::open_governor(&config);
    assert_eq!(reopened.current_delay(&flash), Duration::from_millis(4000));
}
