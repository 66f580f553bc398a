//! Adaptive rate governor.
//!
//! The governor decides how long a caller must wait before starting a request
//! to a given model, and tunes that delay from observed outcomes:
//! - **Throttled**: delay follows the provider's retry hint, or doubles
//! - **Success streak**: every `success_threshold` successes cut the delay by 10%
//!
//! Slots are reserved when a caller commits to waiting, not when its request
//! finishes, so concurrent callers for one model start on a steady cadence
//! even while earlier requests are still in flight.

use crate::state::DelayStore;
use crate::{
    BaseDelays, DelayPersistence, DelayRecord, GovernorConfig, MemoryDelayStore, RateLimitError,
    RateLimitErrorKind, RateLimitResult, RemarkConfig, ThrottleState, parse_retry_after,
};
use remark_core::ModelId;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Progress hook invoked with the remaining wait before a caller suspends.
pub type WaitCallback<'a> = &'a (dyn Fn(Duration) + Send + Sync);

/// Owner of all throttling state.
///
/// Every mutation goes through [`mark_success`](Self::mark_success),
/// [`mark_throttled`](Self::mark_throttled),
/// [`reset_adaptive`](Self::reset_adaptive) or the slot reservation in
/// [`await_ready`](Self::await_ready).
///
/// # Example
///
/// ```rust,ignore
/// let governor = RateGovernor::new(&config, Arc::new(FileDelayStore::new(path)));
/// governor.await_ready(&model, None, Some(&cancel)).await?;
/// match provider.call(&model, prompt, &options).await {
///     Ok(_) => governor.mark_success(&model),
///     Err(e) => governor.mark_throttled(&model, Some(&e.raw_text())),
/// }
/// ```
pub struct RateGovernor {
    settings: GovernorConfig,
    bases: BaseDelays,
    store: Mutex<DelayStore>,
}

impl std::fmt::Debug for RateGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGovernor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RateGovernor {
    /// Create a governor, loading persisted delays once.
    #[instrument(skip_all)]
    pub fn new(config: &RemarkConfig, persistence: Arc<dyn DelayPersistence>) -> Self {
        debug!("Creating rate governor");
        Self {
            settings: config.governor.clone(),
            bases: config.base_delays(),
            store: Mutex::new(DelayStore::open(persistence)),
        }
    }

    /// Governor whose tuning lasts only for this process.
    pub fn in_memory(config: &RemarkConfig) -> Self {
        Self::new(config, Arc::new(MemoryDelayStore::new()))
    }

    /// Tuning constants in force.
    pub fn settings(&self) -> &GovernorConfig {
        &self.settings
    }

    fn store(&self) -> MutexGuard<'_, DelayStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How long a request to `model` would have to wait right now.
    pub fn wait_time(&self, model: &ModelId) -> Duration {
        let store = self.store();
        store
            .get(model)
            .map(|state| state.wait_time(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Delay currently enforced for `model`.
    pub fn current_delay(&self, model: &ModelId) -> Duration {
        let mut store = self.store();
        let state = store.get_or_create(model, &self.bases, &self.settings);
        Duration::from_millis(*state.current_delay_ms())
    }

    /// Read-only copy of the state for `model`, if it has been used.
    pub fn snapshot(&self, model: &ModelId) -> Option<ThrottleState> {
        self.store().get(model).cloned()
    }

    /// Read-only copies of every state created this session.
    pub fn snapshot_all(&self) -> BTreeMap<ModelId, ThrottleState> {
        self.store()
            .states()
            .map(|(model, state)| (model.clone(), state.clone()))
            .collect()
    }

    /// Current delays for every known model, including ones only seen in the
    /// persisted record.
    pub fn tuned_delays(&self) -> DelayRecord {
        self.store().record()
    }

    /// Wait until a request to `model` may start.
    ///
    /// The start slot is reserved before sleeping. If `cancel` fires during
    /// the wait the call returns a cancellation error and the slot stays
    /// reserved, so an immediate retry cannot jump the queue.
    ///
    /// Returns how long the caller was asked to wait.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitErrorKind::Cancelled` if `cancel` fires first.
    #[instrument(skip(self, on_wait, cancel), fields(model = %model))]
    pub async fn await_ready(
        &self,
        model: &ModelId,
        on_wait: Option<WaitCallback<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> RateLimitResult<Duration> {
        let wait = {
            let mut store = self.store();
            store
                .get_or_create(model, &self.bases, &self.settings)
                .reserve(Instant::now())
        };

        let cancelled = || RateLimitError::new(RateLimitErrorKind::Cancelled(model.to_string()));

        if wait.is_zero() {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                return Err(cancelled());
            }
            return Ok(wait);
        }

        debug!(wait_ms = wait.as_millis() as u64, "Waiting for start slot");
        if let Some(callback) = on_wait {
            callback(wait);
        }

        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Wait cancelled; slot stays reserved");
                        Err(cancelled())
                    }
                    _ = tokio::time::sleep(wait) => Ok(wait),
                }
            }
            None => {
                tokio::time::sleep(wait).await;
                Ok(wait)
            }
        }
    }

    /// Record a successful call.
    ///
    /// Every `success_threshold` consecutive successes shrink the delay by
    /// `success_reduction_factor`, never below the recovery floor.
    #[instrument(skip(self), fields(model = %model))]
    pub fn mark_success(&self, model: &ModelId) {
        let mut store = self.store();
        let state = store.get_or_create(model, &self.bases, &self.settings);
        if state.record_success(&self.settings) {
            info!(
                delay_ms = *state.current_delay_ms(),
                "Success streak reached; delay reduced"
            );
            store.persist();
        }
    }

    /// Record a throttling failure.
    ///
    /// A retry hint in `raw_error` (plus a small buffer) becomes the new delay;
    /// otherwise the delay grows by `error_increase_factor`. Either way the
    /// delay never decreases and never exceeds `base * max_backoff_multiplier`.
    #[instrument(skip(self, raw_error), fields(model = %model))]
    pub fn mark_throttled(&self, model: &ModelId, raw_error: Option<&str>) {
        let hint = raw_error.and_then(parse_retry_after);
        let mut store = self.store();
        let state = store.get_or_create(model, &self.bases, &self.settings);
        let before = *state.current_delay_ms();
        state.record_throttled(hint, &self.settings);
        warn!(
            before_ms = before,
            delay_ms = *state.current_delay_ms(),
            hinted = hint.is_some(),
            "Throttled; delay increased"
        );
        store.persist();
    }

    /// Restore base delays and clear streaks, for one model or all of them.
    #[instrument(skip(self))]
    pub fn reset_adaptive(&self, model: Option<&ModelId>) {
        let mut store = self.store();
        match model {
            Some(model) => {
                store
                    .get_or_create(model, &self.bases, &self.settings)
                    .reset();
            }
            None => store.states_mut().for_each(ThrottleState::reset),
        }
        store.forget_persisted(model);
        info!("Adaptive delays reset");
        store.persist();
    }
}
