//! One-stop wiring of governor, orchestrator and validator.

use remark_core::{CallOptions, Completion, ModelCatalog, ModelId, Provider, ProviderCall};
use remark_orchestrator::{
    CredentialValidator, FallbackOrchestrator, ModelDirectory, OrchestratorResult,
    ValidationOutcome,
};
use remark_rate_limit::{FileDelayStore, RateGovernor, RemarkConfig, WaitCallback};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// A configured remark session.
///
/// Everything shares one [`RateGovernor`] and one [`ModelDirectory`], so
/// validation, generation and the CLI all see the same throttling state and
/// the same knowledge of which models exist.
#[derive(Debug)]
pub struct Remark {
    config: RemarkConfig,
    governor: Arc<RateGovernor>,
    directory: Arc<ModelDirectory>,
    orchestrator: FallbackOrchestrator,
    validator: CredentialValidator,
}

impl Remark {
    /// Governor persisting to the configured store, or in memory when no
    /// store location can be determined.
    #[instrument(skip_all)]
    pub fn open_governor(config: &RemarkConfig) -> Arc<RateGovernor> {
        match config.store_path() {
            Some(path) => {
                debug!(path = %path.display(), "Using file-backed delay store");
                Arc::new(RateGovernor::new(config, Arc::new(FileDelayStore::new(path))))
            }
            None => {
                info!("No data directory; adaptive delays will not persist");
                Arc::new(RateGovernor::in_memory(config))
            }
        }
    }

    /// Session using the configured delay store.
    pub fn new(
        config: RemarkConfig,
        provider: Arc<dyn ProviderCall>,
        catalog: Option<Arc<dyn ModelCatalog>>,
    ) -> Self {
        let governor = Self::open_governor(&config);
        Self::with_governor(config, governor, provider, catalog)
    }

    /// Session around an existing governor.
    pub fn with_governor(
        config: RemarkConfig,
        governor: Arc<RateGovernor>,
        provider: Arc<dyn ProviderCall>,
        catalog: Option<Arc<dyn ModelCatalog>>,
    ) -> Self {
        let directory = Arc::new(ModelDirectory::new(
            catalog.clone(),
            config.orchestrator.cache_model_lists,
        ));

        let orchestrator = FallbackOrchestrator::new(
            Arc::clone(&governor),
            Arc::clone(&provider),
            config.orchestrator.clone(),
        )
        .with_directory(Arc::clone(&directory));

        let mut validator = CredentialValidator::new(Arc::clone(&governor), provider, &config)
            .with_directory(Arc::clone(&directory));
        if let Some(catalog) = catalog {
            validator = validator.with_catalog(catalog);
        }

        Self {
            config,
            governor,
            directory,
            orchestrator,
            validator,
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &RemarkConfig {
        &self.config
    }

    /// Shared rate governor.
    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Generate text with fallback. See [`FallbackOrchestrator::generate`].
    ///
    /// # Errors
    ///
    /// Returns the orchestrator's terminal error.
    pub async fn generate(
        &self,
        model: &ModelId,
        prompt: &str,
        options: &CallOptions,
        on_wait: Option<WaitCallback<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> OrchestratorResult<Completion> {
        self.orchestrator
            .generate(model, prompt, options, on_wait, cancel)
            .await
    }

    /// Validate a credential. See [`CredentialValidator::validate`].
    ///
    /// # Errors
    ///
    /// Returns an error on cancellation or when no validation model is known.
    pub async fn validate(
        &self,
        provider: Provider,
        model: Option<&str>,
        cancel: Option<&CancellationToken>,
    ) -> OrchestratorResult<ValidationOutcome> {
        self.validator.validate(provider, model, cancel).await
    }

    /// Forget everything learned about `provider`'s models, e.g. after the
    /// user replaces its key.
    pub fn credential_changed(&self, provider: Provider) {
        info!(provider = %provider, "Credential changed; forgetting model lists");
        self.directory.forget(Some(provider));
    }
}
