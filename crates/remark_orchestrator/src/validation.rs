//! Credential validation with model auto-heal.
//!
//! Validation is deliberately gentler than orchestration: a throttled key is
//! still a valid key, so throttling failures report success with a warning.

use crate::{
    ClassifyContext, FailureClassifier, ModelDirectory, OrchestratorError, OrchestratorResult,
    model_listed,
};
use remark_core::{CallOptions, FailureClass, ModelCatalog, ModelId, Provider, ProviderCall};
use remark_rate_limit::{ProviderSettings, RateGovernor, RemarkConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const VALIDATION_PROMPT: &str = "Reply with the single word: ok";
const VALIDATION_MAX_TOKENS: u32 = 8;

/// Result of validating a credential.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ValidationOutcome {
    /// The key works
    #[display("valid ({})", model_used)]
    Valid {
        /// Model that answered the test call
        model_used: ModelId,
        /// Configured model that was replaced by the known-good one
        healed_from: Option<ModelId>,
    },
    /// The key is valid but currently throttled
    #[display("valid, quota-limited on {}", model)]
    QuotaLimited {
        /// Model that was throttled
        model: ModelId,
        /// Raw provider text
        message: String,
    },
    /// The provider rejected the key
    #[display("invalid credential")]
    InvalidCredential {
        /// Raw provider text
        message: String,
    },
    /// Neither the configured nor the known-good model is usable
    #[display("model {} unavailable", requested)]
    ModelUnavailable {
        /// Model the caller asked for
        requested: ModelId,
        /// Models the credential can use, when the provider lists them
        available: Vec<String>,
    },
    /// Anything else; the key may or may not be valid
    #[display("validation failed ({})", class)]
    Failed {
        /// Class of the failure
        class: FailureClass,
        /// Raw provider text
        message: String,
    },
}

impl ValidationOutcome {
    /// Whether the key should be accepted.
    pub fn is_valid(&self) -> bool {
        matches!(
            self,
            ValidationOutcome::Valid { .. } | ValidationOutcome::QuotaLimited { .. }
        )
    }

    /// User-facing guidance, if the outcome needs any.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            ValidationOutcome::Valid { healed_from: None, .. } => None,
            ValidationOutcome::Valid { .. } => Some(
                "The selected model is not available with this key; a working default was used instead.",
            ),
            ValidationOutcome::QuotaLimited { .. } => Some(
                "The key is valid but currently rate-limited. Requests will be slowed down automatically.",
            ),
            ValidationOutcome::InvalidCredential { .. } => {
                Some(FailureClass::InvalidCredential.guidance())
            }
            ValidationOutcome::ModelUnavailable { .. } => {
                Some(FailureClass::ModelUnavailable.guidance())
            }
            ValidationOutcome::Failed { class, .. } => Some(class.guidance()),
        }
    }
}

/// Outcome of one validation attempt.
enum Attempt {
    Succeeded,
    Failed { class: FailureClass, message: String },
}

/// Checks a freshly entered credential.
///
/// Runs an optional listing probe, then one small generation call against
/// the provider's low-cost validation model. If that model does not exist
/// the provider's known-good model is tried once instead.
pub struct CredentialValidator {
    governor: Arc<RateGovernor>,
    provider: Arc<dyn ProviderCall>,
    catalog: Option<Arc<dyn ModelCatalog>>,
    directory: Option<Arc<ModelDirectory>>,
    providers: HashMap<String, ProviderSettings>,
    classifier: FailureClassifier,
}

impl std::fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialValidator")
            .field("has_catalog", &self.catalog.is_some())
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

impl CredentialValidator {
    /// Validator using the provider settings from `config`.
    pub fn new(
        governor: Arc<RateGovernor>,
        provider: Arc<dyn ProviderCall>,
        config: &RemarkConfig,
    ) -> Self {
        Self {
            governor,
            provider,
            catalog: None,
            directory: None,
            providers: config.providers.clone(),
            classifier: FailureClassifier::new(),
        }
    }

    /// Probe credentials by listing models.
    pub fn with_catalog(mut self, catalog: Arc<dyn ModelCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Share probe results and confirmations with an orchestrator.
    pub fn with_directory(mut self, directory: Arc<ModelDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    fn settings(&self, provider: Provider) -> Option<&ProviderSettings> {
        self.providers.get(provider.as_ref()).or_else(|| {
            self.providers
                .iter()
                .find(|(name, _)| name.parse::<Provider>().ok() == Some(provider))
                .map(|(_, settings)| settings)
        })
    }

    /// Validate the credential behind `provider`.
    ///
    /// `model` overrides the validation model. Without it the configured
    /// model is used, falling back to [`Provider::validation_model`].
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if `cancel` fires.
    #[instrument(skip(self, cancel))]
    pub async fn validate(
        &self,
        provider: Provider,
        model: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> OrchestratorResult<ValidationOutcome> {
        let settings = self.settings(provider);
        let requested = ModelId::new(
            provider,
            model
                .or_else(|| settings.and_then(|s| s.validation_model.as_deref()))
                .unwrap_or(provider.validation_model()),
        );

        let available = match self.probe(provider).await {
            Ok(available) => available,
            Err(message) => {
                info!("Probe rejected the credential");
                return Ok(ValidationOutcome::InvalidCredential { message });
            }
        };

        let (class, message) = match self
            .attempt(&requested, available.as_deref(), cancel)
            .await?
        {
            Attempt::Succeeded => {
                return Ok(ValidationOutcome::Valid {
                    model_used: requested,
                    healed_from: None,
                });
            }
            Attempt::Failed { class, message } => (class, message),
        };

        if class != FailureClass::ModelUnavailable {
            return Ok(Self::outcome(&requested, class, message));
        }

        // Auto-heal, once.
        let unavailable = || ValidationOutcome::ModelUnavailable {
            requested: requested.clone(),
            available: available.clone().unwrap_or_default(),
        };
        let known_good = requested.with_model(
            settings
                .and_then(|s| s.known_good_model.as_deref())
                .unwrap_or(provider.known_good_model()),
        );
        if known_good == requested {
            debug!("Known-good model is the one that failed; nothing to heal with");
            return Ok(unavailable());
        }
        if let Some(list) = &available
            && !model_listed(list, known_good.model())
        {
            warn!(known_good = %known_good, "Known-good model is not available to this key");
            return Ok(unavailable());
        }

        info!(from = %requested, to = %known_good, "Healing validation model");
        match self
            .attempt(&known_good, available.as_deref(), cancel)
            .await?
        {
            Attempt::Succeeded => Ok(ValidationOutcome::Valid {
                model_used: known_good,
                healed_from: Some(requested),
            }),
            Attempt::Failed {
                class: FailureClass::ModelUnavailable,
                ..
            } => Ok(unavailable()),
            Attempt::Failed { class, message } => Ok(Self::outcome(&known_good, class, message)),
        }
    }

    /// List models. `Ok(None)` when there is nothing to probe with.
    ///
    /// Any listing failure other than `Unsupported` rejects the key.
    async fn probe(&self, provider: Provider) -> Result<Option<Vec<String>>, String> {
        let Some(catalog) = &self.catalog else {
            return Ok(None);
        };
        match catalog.list_models(provider).await {
            Ok(models) => {
                debug!(models = models.len(), "Probe succeeded");
                if let Some(directory) = &self.directory {
                    directory.remember(provider, &models);
                }
                Ok(Some(models))
            }
            Err(e) if e.is_unsupported() => {
                debug!("Provider cannot list models; skipping probe");
                Ok(None)
            }
            Err(e) => {
                let message = e.raw_text();
                debug!(error = %message, "Probe failed");
                Err(message)
            }
        }
    }

    /// One throttled generation call.
    async fn attempt(
        &self,
        model: &ModelId,
        available: Option<&[String]>,
        cancel: Option<&CancellationToken>,
    ) -> OrchestratorResult<Attempt> {
        self.governor
            .await_ready(model, None, cancel)
            .await
            .map_err(|e| OrchestratorError::from_wait(model, e))?;

        let options = CallOptions::builder()
            .max_tokens(VALIDATION_MAX_TOKENS)
            .build()
            .unwrap_or_default();
        let call = self.provider.call(model, VALIDATION_PROMPT, &options);
        let result = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(OrchestratorError::cancelled(model)),
                result = call => result,
            },
            None => call.await,
        };

        match result {
            Ok(_) => {
                self.governor.mark_success(model);
                if let Some(directory) = &self.directory {
                    directory.confirm(model);
                }
                Ok(Attempt::Succeeded)
            }
            Err(e) => {
                let message = e.raw_text();
                let mut ctx = ClassifyContext::generation(model.model());
                if let Some(list) = available {
                    ctx = ctx.with_available(list);
                }
                let class = self.classifier.classify(&message, &ctx);
                if class.is_throttling() {
                    self.governor.mark_throttled(model, Some(&message));
                }
                warn!(model = %model, class = %class, error = %message, "Validation call failed");
                Ok(Attempt::Failed { class, message })
            }
        }
    }

    fn outcome(model: &ModelId, class: FailureClass, message: String) -> ValidationOutcome {
        match class {
            FailureClass::InvalidCredential => ValidationOutcome::InvalidCredential { message },
            class if class.is_throttling() => ValidationOutcome::QuotaLimited {
                model: model.clone(),
                message,
            },
            class => ValidationOutcome::Failed { class, message },
        }
    }
}
