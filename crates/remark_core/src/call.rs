//! Request options and responses exchanged with provider adapters.

use crate::ModelId;
use serde::{Deserialize, Serialize};

/// Generation options passed through to the provider untouched.
///
/// # Examples
///
/// ```
/// use remark_core::CallOptions;
///
/// let options = CallOptions::builder()
///     .temperature(0.4f32)
///     .max_tokens(256u32)
///     .build()
///     .unwrap();
/// assert_eq!(*options.max_tokens(), Some(256));
/// assert_eq!(*options.system_instruction(), None);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(default, setter(into, strip_option))]
pub struct CallOptions {
    /// Sampling temperature
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    max_tokens: Option<u32>,
    /// System prompt prepended by the adapter
    system_instruction: Option<String>,
}

impl CallOptions {
    /// Creates a new options builder.
    pub fn builder() -> CallOptionsBuilder {
        CallOptionsBuilder::default()
    }
}

/// Text returned by a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Generated text
    pub text: String,
}

impl CallResponse {
    /// Wrap generated text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Text plus the model that actually produced it.
///
/// Returned by the fallback orchestrator; `model_used` differs from the
/// requested model when a fallback candidate answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Candidate that succeeded
    pub model_used: ModelId,
}
