//! Delay store persistence error types.

/// Kinds of persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Failed to create the directory holding the store
    #[display("Failed to create store directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to read the backing file
    #[display("Failed to read store: {}", _0)]
    Read(String),
    /// Failed to write the backing file
    #[display("Failed to write store: {}", _0)]
    Write(String),
    /// Stored record could not be decoded
    #[display("Corrupt store record: {}", _0)]
    Corrupt(String),
    /// Record could not be encoded
    #[display("Failed to encode store record: {}", _0)]
    Encode(String),
}

/// Persistence error with location tracking.
///
/// # Examples
///
/// ```
/// use remark_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::Corrupt("expected object".to_string()));
/// assert!(format!("{}", err).contains("Corrupt"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;
