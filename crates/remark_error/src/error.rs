//! Top-level error wrapper types.

use crate::{ConfigError, ProviderError, StoreError};

/// Foundation error enum shared across the workspace.
///
/// # Examples
///
/// ```
/// use remark_error::{RemarkError, ConfigError};
///
/// let err: RemarkError = ConfigError::new("bad value").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RemarkErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Delay store persistence error
    #[from(StoreError)]
    Store(StoreError),
    /// Provider adapter error
    #[from(ProviderError)]
    Provider(ProviderError),
}

/// Remark error with kind discrimination.
///
/// # Examples
///
/// ```
/// use remark_error::{RemarkResult, ConfigError};
///
/// fn might_fail() -> RemarkResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Remark Error: {}", _0)]
pub struct RemarkError(Box<RemarkErrorKind>);

impl RemarkError {
    /// Create a new error from a kind.
    pub fn new(kind: RemarkErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RemarkErrorKind {
        &self.0
    }
}

impl<T> From<T> for RemarkError
where
    T: Into<RemarkErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for remark operations.
pub type RemarkResult<T> = std::result::Result<T, RemarkError>;
