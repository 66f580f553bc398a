//! Failure classification, fallback orchestration and credential validation.
//!
//! Data flows one way: the [`FallbackOrchestrator`] waits on the shared
//! rate governor, calls the provider, and on failure asks the
//! [`FailureClassifier`] what happened and [`plan_transition`] what to do
//! next. The [`CredentialValidator`] reuses the same pieces for a single,
//! more forgiving attempt.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod directory;
mod error;
mod fallback;
mod machine;
mod validation;

pub use classifier::{CallPhase, ClassifyContext, FailureClassifier, is_quota_shaped, model_listed};
pub use directory::ModelDirectory;
pub use error::{OrchestratorError, OrchestratorErrorKind, OrchestratorResult};
pub use fallback::FallbackOrchestrator;
pub use machine::{CallState, Transition, plan_transition};
pub use validation::{CredentialValidator, ValidationOutcome};
