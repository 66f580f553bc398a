//! Errors raised by provider adapters.
//!
//! Vendors report failures inconsistently, so a provider error carries only the
//! human-readable text (and the HTTP status when one was seen). Callers must not
//! branch on anything but that text; classification lives in the orchestrator.

/// Provider failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// The provider answered with an HTTP error status
    #[display("HTTP {} error: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message returned by the provider
        message: String,
    },
    /// The request failed before a status was available (network, decoding)
    #[display("{}", _0)]
    Request(String),
    /// The provider does not offer this capability (e.g. model listing)
    #[display("Operation not supported by provider: {}", _0)]
    Unsupported(String),
}

/// Provider error with location tracking.
///
/// # Examples
///
/// ```
/// use remark_error::{ProviderError, ProviderErrorKind};
///
/// let err = ProviderError::new(ProviderErrorKind::Api {
///     status: 429,
///     message: "Please retry in 3.0s".to_string(),
/// });
/// assert_eq!(err.raw_text(), "HTTP 429 error: Please retry in 3.0s");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new provider error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for an HTTP error status.
    #[track_caller]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Api {
            status,
            message: message.into(),
        })
    }

    /// Shorthand for a failure without a status code.
    #[track_caller]
    pub fn request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Request(message.into()))
    }

    /// The provider-facing text, without location decoration.
    ///
    /// This is the only input the failure classifier sees.
    pub fn raw_text(&self) -> String {
        self.kind.to_string()
    }

    /// Whether the provider lacks the requested capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::Unsupported(_))
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
