//! Failure classification.
//!
//! Vendors report failures as loosely structured text, so every pattern the
//! orchestrator relies on lives here. Rules are checked in priority order and
//! the first match wins:
//!
//! 1. 429 / quota / rate wording. A quota-shaped message for a model that has
//!    not been confirmed to exist is checked against the credential's model
//!    list: providers sometimes answer an unknown model with a quota error.
//! 2. 404 mentioning a model.
//! 3. Authentication or authorization failure.
//! 4. A retry-after hint, a 5xx status or network trouble. Only the status
//!    position counts; a 5xx-looking number inside a message does not.
//! 5. Anything else.

use regex::Regex;
use remark_core::FailureClass;
use remark_rate_limit::parse_retry_after;
use std::sync::LazyLock;

static QUOTA_SHAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b429\b|quota|\brate\b|rate[\s_-]?limit|too\s+many\s+requests|resource[\s_]exhausted",
    )
    .expect("quota pattern is valid")
});

static QUOTA_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)quota|resource[\s_]exhausted|billing|credits").expect("quota wording is valid")
});

static NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b404\b|not[\s_]found").expect("404 pattern is valid"));

static MENTIONS_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)model").expect("model pattern is valid"));

static AUTH_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b40[13]\b|invalid[\s_-]*(?:api[\s_-]*)?key|api[\s_-]*key\s+not\s+valid|incorrect\s+api\s+key|unauthori[sz]ed|unauthenticated|permission[\s_]denied",
    )
    .expect("auth pattern is valid")
});

static TRANSIENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*5\d\d\b|\b(?:http|status(?:[\s_]code)?)\W*5\d\d\b|overloaded|(?:service|temporarily)[\s_]+unavailable|status\W+unavailable|timed?[\s_-]?out|connection\s+(?:reset|refused|closed)|network|try\s+again\s+later",
    )
    .expect("transient pattern is valid")
});

/// Which kind of provider call produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CallPhase {
    /// Listing the models available to a credential
    Listing,
    /// Generating text
    #[default]
    Generation,
}

/// Facts about the failed call that the text alone cannot tell.
///
/// # Examples
///
/// ```
/// use remark_orchestrator::ClassifyContext;
///
/// let available = vec!["gemini-2.5-flash".to_string()];
/// let ctx = ClassifyContext::generation("gemini-3-ultra").with_available(&available);
/// assert!(!ctx.model_confirmed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassifyContext<'a> {
    phase: CallPhase,
    model: Option<&'a str>,
    model_confirmed: bool,
    available_models: Option<&'a [String]>,
}

impl<'a> ClassifyContext<'a> {
    /// Context for a failed model listing.
    pub fn listing() -> Self {
        Self {
            phase: CallPhase::Listing,
            ..Self::default()
        }
    }

    /// Context for a failed generation call against `model`.
    pub fn generation(model: &'a str) -> Self {
        Self {
            phase: CallPhase::Generation,
            model: Some(model),
            ..Self::default()
        }
    }

    /// Mark the model as known to exist for this credential.
    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.model_confirmed = confirmed;
        self
    }

    /// Supply the credential's model list for disambiguation.
    pub fn with_available(mut self, models: &'a [String]) -> Self {
        self.available_models = Some(models);
        self
    }

    /// Phase the failure occurred in.
    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Whether the model is known to exist, either from context or because
    /// it appears in the supplied model list.
    pub fn model_confirmed(&self) -> bool {
        self.model_confirmed
            || match (self.model, self.available_models) {
                (Some(model), Some(available)) => model_listed(available, model),
                _ => false,
            }
    }
}

/// Whether `model` appears in a provider's model list.
///
/// Gemini lists names as `models/<name>`; the prefix is ignored.
pub fn model_listed(available: &[String], model: &str) -> bool {
    let wanted = model.strip_prefix("models/").unwrap_or(model);
    available
        .iter()
        .any(|name| name.strip_prefix("models/").unwrap_or(name) == wanted)
}

/// Whether `text` looks like a quota or rate-limit failure.
///
/// The orchestrator uses this to decide whether fetching the model list for
/// disambiguation is worthwhile.
pub fn is_quota_shaped(text: &str) -> bool {
    QUOTA_SHAPED.is_match(text)
}

/// Maps provider error text to a [`FailureClass`].
///
/// Classification is pure: the same text and context always give the same
/// class.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureClassifier;

impl FailureClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use remark_core::FailureClass;
    /// use remark_orchestrator::{ClassifyContext, FailureClassifier};
    ///
    /// let classifier = FailureClassifier::new();
    /// let ctx = ClassifyContext::generation("gemini-2.5-flash").confirmed(true);
    /// assert_eq!(
    ///     classifier.classify("HTTP 429 error: Please retry in 3.0s", &ctx),
    ///     FailureClass::RateLimited
    /// );
    /// ```
    pub fn classify(&self, text: &str, ctx: &ClassifyContext<'_>) -> FailureClass {
        if is_quota_shaped(text) {
            let throttled = if QUOTA_WORDING.is_match(text) {
                FailureClass::QuotaExceeded
            } else {
                FailureClass::RateLimited
            };
            if ctx.phase == CallPhase::Listing || ctx.model_confirmed() {
                return throttled;
            }
            return match (ctx.model, ctx.available_models) {
                (Some(model), Some(available)) if !model_listed(available, model) => {
                    FailureClass::ModelUnavailable
                }
                _ => throttled,
            };
        }

        if NOT_FOUND.is_match(text) && MENTIONS_MODEL.is_match(text) {
            return FailureClass::ModelUnavailable;
        }

        if AUTH_FAILURE.is_match(text) {
            return FailureClass::InvalidCredential;
        }

        if parse_retry_after(text).is_some() || TRANSIENT.is_match(text) {
            return FailureClass::Transient;
        }

        FailureClass::Unknown
    }
}
