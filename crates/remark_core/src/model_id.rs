//! Model identifiers.

use remark_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// LLM vendors the orchestrator knows how to address.
///
/// # Examples
///
/// ```
/// use remark_core::Provider;
///
/// assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Google);
/// assert_eq!(Provider::OpenRouter.to_string(), "openrouter");
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
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    /// Google AI Studio (Gemini)
    #[strum(to_string = "google", serialize = "gemini")]
    #[serde(alias = "gemini")]
    Google,
    /// OpenAI
    #[strum(to_string = "openai")]
    OpenAi,
    /// OpenRouter and other OpenAI-compatible gateways
    #[strum(to_string = "openrouter")]
    OpenRouter,
}

impl Provider {
    /// Low-cost model used to check a freshly entered key.
    ///
    /// Configuration may override this per provider.
    pub fn validation_model(&self) -> &'static str {
        match self {
            Provider::Google => "gemini-2.5-flash-lite",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::OpenRouter => "meta-llama/llama-3.3-70b-instruct:free",
        }
    }

    /// Model every key for this provider can reach; the auto-heal target
    /// when the validation model does not exist.
    pub fn known_good_model(&self) -> &'static str {
        match self {
            Provider::Google => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::OpenRouter => "meta-llama/llama-3.3-70b-instruct:free",
        }
    }
}

/// Opaque key for a (provider, model) pair, written `provider:model`.
///
/// This is the unit of throttling: every model gets its own adaptive delay.
/// The model half may itself contain `/` or `:` (OpenRouter ids do), so only
/// the first `:` separates the provider.
///
/// # Examples
///
/// ```
/// use remark_core::{ModelId, Provider};
///
/// let id: ModelId = "google:gemini-2.5-flash".parse().unwrap();
/// assert_eq!(id.provider(), Provider::Google);
/// assert_eq!(id.model(), "gemini-2.5-flash");
/// assert_eq!(id.to_string(), "google:gemini-2.5-flash");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(try_from = "String", into = "String")]
#[display("{}:{}", provider, model)]
pub struct ModelId {
    provider: Provider,
    model: String,
}

impl ModelId {
    /// Create an identifier from its parts.
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// The vendor half.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The vendor's own model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Same provider, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self::new(self.provider, model)
    }
}

impl FromStr for ModelId {
    type Err = ConfigError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((provider, model)) = s.split_once(':') else {
            return Err(ConfigError::new(format!(
                "Model id '{}' must be written provider:model",
                s
            )));
        };
        let provider = provider.trim().parse::<Provider>().map_err(|_| {
            ConfigError::new(format!("Unknown provider '{}' in model id '{}'", provider, s))
        })?;
        let model = model.trim();
        if model.is_empty() {
            return Err(ConfigError::new(format!("Model id '{}' has no model name", s)));
        }
        Ok(Self::new(provider, model))
    }
}

impl TryFrom<String> for ModelId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelId> for String {
    fn from(id: ModelId) -> Self {
        id.to_string()
    }
}
