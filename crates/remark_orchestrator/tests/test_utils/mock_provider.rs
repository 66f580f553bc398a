//! Scripted provider and catalog mocks.

use async_trait::async_trait;
use remark_core::{CallOptions, CallResponse, ModelCatalog, ModelId, Provider, ProviderCall};
use remark_error::{ProviderError, ProviderErrorKind, ProviderResult};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// A single scripted response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this text
    Success(String),
    /// Fail with this HTTP status and message
    Http(u16, String),
    /// Answer only after this long (to observe overlap and cancellation)
    Slow(Duration, String),
}

impl MockResponse {
    pub fn ok(text: &str) -> Self {
        Self::Success(text.to_string())
    }

    pub fn http(status: u16, message: &str) -> Self {
        Self::Http(status, message.to_string())
    }
}

/// Provider whose responses are scripted per model.
///
/// Each model has a queue; once a queue runs dry the call fails with an
/// "exhausted" message so unexpected calls are visible.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<ModelId, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<ModelId>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append responses for `model`.
    pub fn script(self, model: &ModelId, responses: Vec<MockResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.clone())
            .or_default()
            .extend(responses);
        self
    }

    /// Models called, in order.
    pub fn calls(&self) -> Vec<ModelId> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self, model: &ModelId) -> Option<MockResponse> {
        self.calls.lock().unwrap().push(model.clone());
        self.scripts
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl ProviderCall for ScriptedProvider {
    async fn call(
        &self,
        model: &ModelId,
        _prompt: &str,
        _options: &CallOptions,
    ) -> ProviderResult<CallResponse> {
        match self.next_response(model) {
            Some(MockResponse::Success(text)) => Ok(CallResponse::new(text)),
            Some(MockResponse::Http(status, message)) => Err(ProviderError::api(status, message)),
            Some(MockResponse::Slow(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(CallResponse::new(text))
            }
            None => Err(ProviderError::request(format!(
                "Mock script exhausted for {}",
                model
            ))),
        }
    }
}

/// Model catalog returning a fixed list (or error) per provider.
#[derive(Debug, Default)]
pub struct MockCatalog {
    lists: HashMap<Provider, Result<Vec<String>, ProviderErrorKind>>,
    calls: Mutex<usize>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(mut self, provider: Provider, models: &[&str]) -> Self {
        self.lists.insert(
            provider,
            Ok(models.iter().map(|m| m.to_string()).collect()),
        );
        self
    }

    pub fn with_error(mut self, provider: Provider, kind: ProviderErrorKind) -> Self {
        self.lists.insert(provider, Err(kind));
        self
    }

    /// Number of listing calls made.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ModelCatalog for MockCatalog {
    async fn list_models(&self, provider: Provider) -> ProviderResult<Vec<String>> {
        *self.calls.lock().unwrap() += 1;
        match self.lists.get(&provider) {
            Some(Ok(models)) => Ok(models.clone()),
            Some(Err(kind)) => Err(ProviderError::new(kind.clone())),
            None => Err(ProviderError::new(ProviderErrorKind::Unsupported(
                format!("{} model listing", provider),
            ))),
        }
    }
}
