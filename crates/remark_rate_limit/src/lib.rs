//! Adaptive per-model throttling.
//!
//! This crate owns every piece of throttling state in remark. Providers publish
//! per-minute quotas inconsistently (and sometimes not at all), so instead of a
//! fixed token bucket each model gets an inter-request delay that grows when
//! the provider pushes back and shrinks slowly after sustained success.
//!
//! ## Components
//!
//! - [`RateGovernor`] - the only public entry point for throttling state
//! - [`DelayPersistence`] - narrow load/save capability for tuned delays
//! - [`RemarkConfig`] - layered TOML configuration (bundled, home, cwd, env)
//! - [`parse_retry_after`] - extracts "retry in Ns" hints from error text

mod config;
mod error;
mod governor;
mod hint;
mod persistence;
mod state;

pub use config::{
    BaseDelays, GovernorConfig, ModelSettings, OrchestratorConfig, ProviderSettings,
    RemarkConfig, StoreConfig,
};
pub use error::{RateLimitError, RateLimitErrorKind, RateLimitResult};
pub use governor::{RateGovernor, WaitCallback};
pub use hint::parse_retry_after;
pub use persistence::{
    ADAPTIVE_DELAYS_KEY, DelayPersistence, DelayRecord, FileDelayStore, MemoryDelayStore,
};
pub use state::ThrottleState;
