//! Error types for the remark workspace.
//!
//! This crate provides the foundation error types shared by every remark crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use remark_error::{ConfigError, RemarkResult};
//!
//! fn load_settings() -> RemarkResult<String> {
//!     Err(ConfigError::new("missing [governor] table"))?
//! }
//!
//! match load_settings() {
//!     Ok(settings) => println!("Got: {}", settings),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod provider;
mod store;

pub use config::ConfigError;
pub use error::{RemarkError, RemarkErrorKind, RemarkResult};
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult};
pub use store::{StoreError, StoreErrorKind, StoreResult};
