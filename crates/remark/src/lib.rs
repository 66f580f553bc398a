//! Remark - adaptive, multi-provider LLM request orchestration
//!
//! Remark sits between an application and the LLM vendors it talks to. It
//! throttles requests per model to stay inside quotas nobody documents,
//! tunes that throttle from what the provider actually says, falls back
//! across models when a call fails, and tells apart a bad key, a bad model
//! name and a temporarily busy provider.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use remark::{CallOptions, Remark, RemarkConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemarkConfig::load()?;
//!     // `GeminiAdapter` is your implementation of `ProviderCall` + `ModelCatalog`
//!     let adapter = Arc::new(GeminiAdapter::new(std::env::var("GEMINI_API_KEY")?));
//!     let remark = Remark::new(config, adapter.clone(), Some(adapter));
//!
//!     let completion = remark
//!         .generate(&"google:gemini-2.5-flash".parse()?, "Hello", &CallOptions::default(), None, None)
//!         .await?;
//!     println!("{}: {}", completion.model_used, completion.text);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `remark_error` - Error types
//! - `remark_core` - Model ids, failure classes, provider traits
//! - `remark_rate_limit` - Adaptive per-model throttling and configuration
//! - `remark_orchestrator` - Classification, fallback and credential validation
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]

mod logging;
mod session;

pub use logging::{LoggingConfig, init_logging, init_logging_with_config};
pub use session::Remark;

pub use remark_error::{
    ConfigError, ProviderError, ProviderErrorKind, ProviderResult, RemarkError, RemarkErrorKind,
    RemarkResult, StoreError, StoreErrorKind, StoreResult,
};

pub use remark_core::{
    AttemptOutcome, AttemptRecord, CallOptions, CallOptionsBuilder, CallResponse, Completion,
    FailureClass, ModelCatalog, ModelId, Provider, ProviderCall,
};

pub use remark_rate_limit::{
    ADAPTIVE_DELAYS_KEY, BaseDelays, DelayPersistence, DelayRecord, FileDelayStore,
    GovernorConfig, MemoryDelayStore, ModelSettings, OrchestratorConfig, ProviderSettings,
    RateGovernor, RateLimitError, RateLimitErrorKind, RateLimitResult, RemarkConfig, StoreConfig,
    ThrottleState, WaitCallback, parse_retry_after,
};

pub use remark_orchestrator::{
    CallPhase, CallState, ClassifyContext, CredentialValidator, FailureClassifier,
    FallbackOrchestrator, ModelDirectory, OrchestratorError, OrchestratorErrorKind,
    OrchestratorResult, Transition, ValidationOutcome, is_quota_shaped, model_listed,
    plan_transition,
};

pub use tokio_util::sync::CancellationToken;
