//! Errors surfaced by orchestrated calls.
//!
//! Only terminal outcomes become errors. Everything recoverable (throttling,
//! transient trouble, a missing fallback model) is handled inside the
//! orchestrator and shows up here only once every candidate is exhausted.

use remark_core::{FailureClass, ModelId};
use remark_rate_limit::RateLimitError;

/// Terminal failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum OrchestratorErrorKind {
    /// The caller cancelled while a call was waiting or in flight
    #[display("Cancelled during call to {}", _0)]
    Cancelled(ModelId),

    /// No candidate succeeded
    #[display(
        "{} on {} after {} attempt(s): {}",
        class,
        last_model,
        attempts,
        message
    )]
    Exhausted {
        /// Class of the last failure
        class: FailureClass,
        /// Raw provider text of the last failure
        message: String,
        /// Candidate that failed last
        last_model: ModelId,
        /// Provider attempts made
        attempts: usize,
        /// Models the credential can use, when the last failure was
        /// `model-unavailable` and a listing was possible
        available_models: Option<Vec<String>>,
    },
}

/// Orchestration error with location tracking.
///
/// # Examples
///
/// ```
/// use remark_core::FailureClass;
/// use remark_orchestrator::{OrchestratorError, OrchestratorErrorKind};
///
/// let err = OrchestratorError::new(OrchestratorErrorKind::Exhausted {
///     class: FailureClass::InvalidCredential,
///     message: "HTTP 401 error: invalid api key".to_string(),
///     last_model: "openai:gpt-4o-mini".parse().unwrap(),
///     attempts: 1,
///     available_models: None,
/// });
/// assert_eq!(err.failure_class(), Some(FailureClass::InvalidCredential));
/// assert!(!err.is_cancelled());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Orchestrator Error: {} at line {} in {}", kind, line, file)]
pub struct OrchestratorError {
    /// The kind of error that occurred
    pub kind: OrchestratorErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl OrchestratorError {
    /// Create a new orchestration error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OrchestratorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &OrchestratorErrorKind {
        &self.kind
    }

    /// Whether the caller cancelled the call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, OrchestratorErrorKind::Cancelled(_))
    }

    /// Class of the last failure, for exhausted calls.
    pub fn failure_class(&self) -> Option<FailureClass> {
        match &self.kind {
            OrchestratorErrorKind::Exhausted { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// Raw provider text of the last failure, for exhausted calls.
    pub fn last_message(&self) -> Option<&str> {
        match &self.kind {
            OrchestratorErrorKind::Exhausted { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Valid alternatives when the last failure was `model-unavailable`.
    pub fn available_models(&self) -> Option<&[String]> {
        match &self.kind {
            OrchestratorErrorKind::Exhausted {
                available_models, ..
            } => available_models.as_deref(),
            _ => None,
        }
    }

    /// User-facing guidance for the failure.
    pub fn guidance(&self) -> &'static str {
        match &self.kind {
            OrchestratorErrorKind::Cancelled(_) => "The request was cancelled.",
            OrchestratorErrorKind::Exhausted { class, .. } => class.guidance(),
        }
    }

    #[track_caller]
    pub(crate) fn cancelled(model: &ModelId) -> Self {
        Self::new(OrchestratorErrorKind::Cancelled(model.clone()))
    }

    #[track_caller]
    pub(crate) fn from_wait(model: &ModelId, err: RateLimitError) -> Self {
        tracing::debug!(error = %err, "Governor wait ended early");
        Self::cancelled(model)
    }
}

/// Result type for orchestrated calls.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
