//! Failure classes that drive recovery decisions.

use serde::{Deserialize, Serialize};

/// Category assigned to a provider failure.
///
/// Derived from error text on every failure, never stored.
///
/// # Examples
///
/// ```
/// use remark_core::FailureClass;
///
/// assert_eq!(FailureClass::RateLimited.to_string(), "rate-limited");
/// assert_eq!("invalid-credential".parse::<FailureClass>().unwrap(), FailureClass::InvalidCredential);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailureClass {
    /// Key rejected by the provider; fatal for that provider
    InvalidCredential,
    /// Account quota exhausted
    QuotaExceeded,
    /// Requests arriving too fast; the credential is fine
    RateLimited,
    /// The configured model does not exist for this credential
    ModelUnavailable,
    /// Temporary provider or network trouble
    Transient,
    /// Nothing recognisable in the error text
    Unknown,
}

impl FailureClass {
    /// Whether this failure should slow down future requests to the model.
    pub fn is_throttling(&self) -> bool {
        matches!(
            self,
            FailureClass::QuotaExceeded | FailureClass::RateLimited | FailureClass::Transient
        )
    }

    /// Whether recovery is pointless (no retry, no fallback).
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailureClass::InvalidCredential)
    }

    /// Short user-facing guidance for this class.
    pub fn guidance(&self) -> &'static str {
        match self {
            FailureClass::InvalidCredential => {
                "The API key was rejected. Check that it was copied correctly and is still active."
            }
            FailureClass::QuotaExceeded => {
                "The provider quota for this key is used up. Requests were retried and other models tried automatically."
            }
            FailureClass::RateLimited => {
                "The provider is temporarily rate-limiting this key. Requests were retried automatically."
            }
            FailureClass::ModelUnavailable => {
                "The selected model is not available with this key. Choose one of the listed models."
            }
            FailureClass::Transient => {
                "The provider had a temporary problem. Try again in a moment."
            }
            FailureClass::Unknown => "The provider returned an unexpected error.",
        }
    }
}
