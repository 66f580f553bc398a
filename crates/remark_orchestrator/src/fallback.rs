//! Fallback orchestration across candidate models.

use crate::{
    CallState, ClassifyContext, FailureClassifier, ModelDirectory, OrchestratorError,
    OrchestratorErrorKind, OrchestratorResult, is_quota_shaped, plan_transition,
};
use chrono::Utc;
use remark_core::{
    AttemptRecord, CallOptions, CallResponse, Completion, FailureClass, ModelCatalog, ModelId,
    Provider, ProviderCall,
};
use remark_error::ProviderResult;
use remark_rate_limit::{OrchestratorConfig, RateGovernor, WaitCallback};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Sequences provider calls across the requested model and its fallbacks.
///
/// Each attempt waits on the shared [`RateGovernor`], calls the provider,
/// and on failure classifies the error and follows [`plan_transition`].
/// Concurrent calls share the governor's start cadence but may overlap in
/// flight.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = FallbackOrchestrator::new(governor, provider, config.orchestrator.clone())
///     .with_catalog(catalog);
/// let completion = orchestrator
///     .generate(&model, "Draft a comment for...", &CallOptions::default(), None, Some(&cancel))
///     .await?;
/// println!("{} answered: {}", completion.model_used, completion.text);
/// ```
pub struct FallbackOrchestrator {
    governor: Arc<RateGovernor>,
    provider: Arc<dyn ProviderCall>,
    directory: Arc<ModelDirectory>,
    classifier: FailureClassifier,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("directory", &self.directory)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FallbackOrchestrator {
    /// Orchestrator without a model catalog.
    ///
    /// Quota-shaped errors can then never be disambiguated and are always
    /// treated as throttling.
    pub fn new(
        governor: Arc<RateGovernor>,
        provider: Arc<dyn ProviderCall>,
        config: OrchestratorConfig,
    ) -> Self {
        let directory = Arc::new(ModelDirectory::new(None, config.cache_model_lists));
        Self {
            governor,
            provider,
            directory,
            classifier: FailureClassifier::new(),
            config,
        }
    }

    /// Use `catalog` to look up available models.
    pub fn with_catalog(mut self, catalog: Arc<dyn ModelCatalog>) -> Self {
        self.directory = Arc::new(ModelDirectory::new(
            Some(catalog),
            self.config.cache_model_lists,
        ));
        self
    }

    /// Share an existing directory, e.g. with a credential validator.
    pub fn with_directory(mut self, directory: Arc<ModelDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// The governor every attempt waits on.
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Session knowledge about available models.
    pub fn directory(&self) -> &Arc<ModelDirectory> {
        &self.directory
    }

    /// Drop cached model lists, e.g. after a key change.
    pub fn forget_models(&self, provider: Option<Provider>) {
        self.directory.forget(provider);
    }

    /// `requested` followed by the configured fallbacks, without duplicates.
    pub fn candidates(&self, requested: &ModelId) -> Vec<ModelId> {
        let mut candidates = vec![requested.clone()];
        for fallback in &self.config.fallbacks {
            if !candidates.contains(fallback) {
                candidates.push(fallback.clone());
            }
        }
        candidates
    }

    /// Generate text, falling back across candidates as needed.
    ///
    /// `on_wait` is invoked with the remaining wait before every throttled
    /// suspension. `cancel` is honoured while waiting and while a provider
    /// call is in flight.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if `cancel` fires
    /// - `Exhausted` with the last failure class and message once no
    ///   candidate or retry remains, or immediately on an invalid credential
    #[instrument(skip(self, prompt, options, on_wait, cancel), fields(requested = %requested))]
    pub async fn generate(
        &self,
        requested: &ModelId,
        prompt: &str,
        options: &CallOptions,
        on_wait: Option<WaitCallback<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> OrchestratorResult<Completion> {
        let candidates = self.candidates(requested);
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut index = 0;
        let mut retries_used = 0;
        let mut state = CallState::Pending;
        debug!(candidates = candidates.len(), %state, "Starting orchestrated call");

        loop {
            let model = &candidates[index];

            state = CallState::Waiting;
            debug!(model = %model, %state);
            let waited = match self.governor.await_ready(model, on_wait, cancel).await {
                Ok(waited) => waited,
                Err(e) => {
                    log_summary(&attempts, "cancelled", false);
                    return Err(OrchestratorError::from_wait(model, e));
                }
            };

            state = CallState::Calling;
            debug!(model = %model, %state);
            let started_at = Utc::now();
            let result = match self.call(model, prompt, options, cancel).await {
                Some(result) => result,
                None => {
                    log_summary(&attempts, "cancelled", false);
                    return Err(OrchestratorError::cancelled(model));
                }
            };

            let error = match result {
                Ok(response) => {
                    self.governor.mark_success(model);
                    self.directory.confirm(model);
                    attempts.push(AttemptRecord::success(model.clone(), started_at, waited));
                    state = CallState::Succeeded;
                    debug!(model = %model, %state);
                    log_summary(&attempts, "succeeded", attempts.len() == 1);
                    return Ok(Completion {
                        text: response.text,
                        model_used: model.clone(),
                    });
                }
                Err(e) => e,
            };

            let message = error.raw_text();
            let (class, available) = self.classify(model, &message).await;
            attempts.push(AttemptRecord::failure(
                model.clone(),
                started_at,
                class,
                waited,
            ));

            let has_next = index + 1 < candidates.len();
            let retries_left = retries_used < self.config.max_retries_same_model;
            let transition = plan_transition(class, has_next, retries_left);
            if transition.throttle {
                self.governor.mark_throttled(model, Some(&message));
            }
            state = transition.next;
            warn!(model = %model, class = %class, %state, error = %message, "Attempt failed");

            match state {
                CallState::Retrying => retries_used += 1,
                CallState::FallingBack => {
                    index += 1;
                    retries_used = 0;
                }
                _ => {
                    let available_models = match (class, available) {
                        (FailureClass::ModelUnavailable, Some(list)) => Some(list.to_vec()),
                        (FailureClass::ModelUnavailable, None) => self
                            .directory
                            .available(model.provider())
                            .await
                            .map(|list| list.to_vec()),
                        _ => None,
                    };
                    log_summary(&attempts, "failed", false);
                    return Err(OrchestratorError::new(OrchestratorErrorKind::Exhausted {
                        class,
                        message,
                        last_model: model.clone(),
                        attempts: attempts.len(),
                        available_models,
                    }));
                }
            }
        }
    }

    /// Run the provider call; `None` means the caller cancelled it.
    async fn call(
        &self,
        model: &ModelId,
        prompt: &str,
        options: &CallOptions,
        cancel: Option<&CancellationToken>,
    ) -> Option<ProviderResult<CallResponse>> {
        let call = self.provider.call(model, prompt, options);
        match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = call => Some(result),
            },
            None => Some(call.await),
        }
    }

    /// Classify a generation failure, fetching the model list when a
    /// quota-shaped error hits a model not yet confirmed this session.
    async fn classify(
        &self,
        model: &ModelId,
        message: &str,
    ) -> (FailureClass, Option<Arc<[String]>>) {
        let mut confirmed = self.directory.is_confirmed(model);
        let available = if !confirmed && is_quota_shaped(message) {
            self.directory.available(model.provider()).await
        } else {
            None
        };
        if let Some(list) = &available {
            confirmed = self.directory.confirm_if_listed(model, list);
        }

        let mut ctx = ClassifyContext::generation(model.model()).confirmed(confirmed);
        if let Some(list) = &available {
            ctx = ctx.with_available(list);
        }
        (self.classifier.classify(message, &ctx), available)
    }
}

/// Log one line describing every attempt of a finished call.
///
/// `routine` calls (first attempt succeeded) are logged at debug level.
fn log_summary(attempts: &[AttemptRecord], result: &str, routine: bool) {
    let summary = attempts
        .iter()
        .map(|a| match a.failure_class() {
            Some(class) => format!(
                "{} {}({}) after {}ms",
                a.model_id(),
                a.outcome(),
                class,
                a.waited_ms()
            ),
            None => format!("{} {} after {}ms", a.model_id(), a.outcome(), a.waited_ms()),
        })
        .collect::<Vec<_>>()
        .join(" -> ");
    let waited_ms: u64 = attempts.iter().map(|a| *a.waited_ms()).sum();

    if routine {
        debug!(attempts = attempts.len(), waited_ms, %summary, "Orchestrated call {}", result);
    } else {
        info!(attempts = attempts.len(), waited_ms, %summary, "Orchestrated call {}", result);
    }
}
