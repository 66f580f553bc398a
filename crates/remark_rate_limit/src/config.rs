//! Configuration structures for throttling and orchestration.
//!
//! This module provides TOML-based configuration. The configuration system
//! supports:
//! - Bundled defaults (include_str! from remark.toml)
//! - User overrides (./remark.toml or ~/.config/remark/remark.toml)
//! - `REMARK__SECTION__KEY` environment overrides
//! - Automatic merging with later sources taking precedence

use config::{Config, Environment, File, FileFormat};
use remark_core::{ModelId, Provider};
use remark_error::{ConfigError, RemarkError, RemarkResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Tuning constants for the adaptive delay.
///
/// # Example
///
/// ```toml
/// [governor]
/// min_delay_ms = 500
/// success_threshold = 3
/// success_reduction_factor = 0.9
/// error_increase_factor = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Absolute floor for any model's delay.
    pub min_delay_ms: u64,
    /// Requests per minute assumed when neither model nor provider says otherwise.
    pub default_rpm: u32,
    /// Consecutive successes needed before the delay is reduced.
    pub success_threshold: u32,
    /// Multiplier applied to the delay after a success streak.
    pub success_reduction_factor: f64,
    /// Multiplier applied to the delay on throttling without a retry hint.
    pub error_increase_factor: f64,
    /// Ceiling for the delay as a multiple of the base delay.
    pub max_backoff_multiplier: u64,
    /// Success streaks never push the delay below `base * recovery_floor_ratio`.
    pub recovery_floor_ratio: f64,
    /// Added to a provider's retry-after hint before it becomes the delay.
    pub retry_hint_buffer_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            default_rpm: 15,
            success_threshold: 3,
            success_reduction_factor: 0.9,
            error_increase_factor: 2.0,
            max_backoff_multiplier: 5,
            recovery_floor_ratio: 0.3,
            retry_hint_buffer_ms: 500,
        }
    }
}

impl GovernorConfig {
    /// Validates that every constant is in a usable range.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay_ms == 0 {
            return Err(ConfigError::new("governor.min_delay_ms must be positive"));
        }
        if self.default_rpm == 0 {
            return Err(ConfigError::new("governor.default_rpm must be positive"));
        }
        if self.success_threshold == 0 {
            return Err(ConfigError::new(
                "governor.success_threshold must be positive",
            ));
        }
        if !(self.success_reduction_factor > 0.0 && self.success_reduction_factor < 1.0) {
            return Err(ConfigError::new(format!(
                "governor.success_reduction_factor must be in (0.0, 1.0), got {}",
                self.success_reduction_factor
            )));
        }
        if self.error_increase_factor <= 1.0 {
            return Err(ConfigError::new(format!(
                "governor.error_increase_factor must be greater than 1.0, got {}",
                self.error_increase_factor
            )));
        }
        if self.max_backoff_multiplier == 0 {
            return Err(ConfigError::new(
                "governor.max_backoff_multiplier must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.recovery_floor_ratio) {
            return Err(ConfigError::new(format!(
                "governor.recovery_floor_ratio must be in [0.0, 1.0], got {}",
                self.recovery_floor_ratio
            )));
        }
        Ok(())
    }
}

/// Per-provider settings.
///
/// ```toml
/// [providers.google]
/// default_rpm = 10
/// validation_model = "gemini-2.5-flash-lite"
/// known_good_model = "gemini-2.5-flash"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ProviderSettings {
    /// Requests per minute for models without their own entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rpm: Option<u32>,

    /// Cheap model used when validating a freshly entered key; overrides the
    /// provider's built-in choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_model: Option<String>,

    /// Model substituted when the configured one turns out not to exist;
    /// overrides the provider's built-in choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_good_model: Option<String>,
}

/// Model-specific overrides.
///
/// Model ids contain dots, so overrides are an array of tables rather than
/// a table keyed by id.
///
/// ```toml
/// [[models]]
/// id = "google:gemini-2.5-pro"
/// rpm = 5
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelSettings {
    /// Model the override applies to
    pub id: ModelId,

    /// Requests per minute (overrides provider default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,

    /// Explicit base delay; wins over `rpm` when both are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,
}

/// Fallback chain and retry budget.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Candidates tried, in order, after the requested model.
    pub fallbacks: Vec<ModelId>,
    /// Extra attempts on the same candidate when nothing is left to fall back to.
    pub max_retries_same_model: u32,
    /// Keep model lists fetched for disambiguation for the rest of the session.
    pub cache_model_lists: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallbacks: Vec::new(),
            max_retries_same_model: 1,
            cache_model_lists: true,
        }
    }
}

/// Where tuned delays are kept between sessions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct StoreConfig {
    /// Path of the JSON file; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Resolves the base delay of any model from configured quotas.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseDelays {
    min_delay_ms: u64,
    default_rpm: u32,
    providers: HashMap<Provider, u32>,
    models: HashMap<ModelId, ModelSettings>,
}

impl ModelSettings {
    /// Override with only an RPM quota.
    pub fn with_rpm(id: ModelId, rpm: u32) -> Self {
        Self {
            id,
            rpm: Some(rpm),
            base_delay_ms: None,
        }
    }
}

impl BaseDelays {
    /// Base delay for `model`, never below the minimum delay.
    ///
    /// Precedence: explicit `base_delay_ms` on the model, then the model's
    /// `rpm`, then the provider's `default_rpm`, then the global default. An RPM
    /// quota becomes `ceil(60000 / rpm)` milliseconds.
    pub fn for_model(&self, model: &ModelId) -> u64 {
        let settings = self.models.get(model);
        let base = match settings.and_then(|s| s.base_delay_ms) {
            Some(ms) => ms,
            None => {
                let rpm = settings
                    .and_then(|s| s.rpm)
                    .or_else(|| self.providers.get(&model.provider()).copied())
                    .unwrap_or(self.default_rpm)
                    .max(1);
                60_000_u64.div_ceil(u64::from(rpm))
            }
        };
        base.max(self.min_delay_ms)
    }
}

/// Top-level remark configuration.
///
/// # Example
///
/// ```no_run
/// use remark_rate_limit::RemarkConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RemarkConfig::load()?;
/// println!("minimum delay: {}ms", config.governor.min_delay_ms);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct RemarkConfig {
    /// Adaptive delay tuning
    #[serde(default)]
    pub governor: GovernorConfig,

    /// Provider name to provider settings
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,

    /// Per-model overrides
    #[serde(default)]
    pub models: Vec<ModelSettings>,

    /// Fallback chain and retry budget
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Delay store location
    #[serde(default)]
    pub store: StoreConfig,
}

impl RemarkConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> RemarkResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                RemarkError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                RemarkError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: env > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source fails to parse or the merged
    /// configuration is out of range.
    #[instrument]
    pub fn load() -> RemarkResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../remark.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/remark/remark.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("remark").required(false))
            .add_source(
                Environment::with_prefix("REMARK")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .map_err(|e| {
                RemarkError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                RemarkError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check governor ranges and provider names.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.governor.validate()?;
        for settings in &self.models {
            if settings.rpm == Some(0) {
                return Err(ConfigError::new(format!(
                    "models.{}.rpm must be positive",
                    settings.id
                )));
            }
        }
        for name in self.providers.keys() {
            name.parse::<Provider>()
                .map_err(|_| ConfigError::new(format!("Unknown provider '{}'", name)))?;
        }
        Ok(())
    }

    /// Settings for `provider`, if configured.
    pub fn provider(&self, provider: Provider) -> Option<&ProviderSettings> {
        self.providers.get(provider.as_ref())
    }

    /// Build the base delay resolver. Unknown provider names are skipped.
    pub fn base_delays(&self) -> BaseDelays {
        let providers = self
            .providers
            .iter()
            .filter_map(|(name, settings)| {
                let provider = name.parse::<Provider>().ok()?;
                Some((provider, settings.default_rpm?))
            })
            .collect();
        let models = self
            .models
            .iter()
            .map(|settings| (settings.id.clone(), settings.clone()))
            .collect();

        BaseDelays {
            min_delay_ms: self.governor.min_delay_ms,
            default_rpm: self.governor.default_rpm,
            providers,
            models,
        }
    }

    /// Location of the delay store file, if one can be determined.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store
            .path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("remark/adaptive_delays.json")))
    }
}
