//! Per-model throttle state and the store that owns it.

use crate::{BaseDelays, DelayPersistence, DelayRecord, GovernorConfig};
use remark_core::ModelId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Adaptive throttle for one model.
///
/// Invariant: `min_delay_ms <= current_delay_ms <= base_delay_ms * max_backoff_multiplier`.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct ThrottleState {
    /// Start of the most recent (or most recently reserved) request.
    last_request_at: Option<Instant>,
    /// Delay currently enforced between request starts.
    current_delay_ms: u64,
    /// Delay derived from the model's configured quota.
    base_delay_ms: u64,
    /// Successes since the last adjustment or throttle.
    success_streak: u32,
}

impl ThrottleState {
    pub(crate) fn new(base_delay_ms: u64, persisted: Option<u64>, cfg: &GovernorConfig) -> Self {
        let mut state = Self {
            last_request_at: None,
            current_delay_ms: base_delay_ms,
            base_delay_ms,
            success_streak: 0,
        };
        if let Some(delay) = persisted {
            state.current_delay_ms = delay;
        }
        state.current_delay_ms = state.clamp(state.current_delay_ms, cfg);
        state
    }

    /// Upper bound for the delay.
    pub fn max_delay_ms(&self, cfg: &GovernorConfig) -> u64 {
        self.base_delay_ms
            .saturating_mul(cfg.max_backoff_multiplier)
            .max(cfg.min_delay_ms)
    }

    /// Lowest delay a success streak can reach.
    pub fn recovery_floor_ms(&self, cfg: &GovernorConfig) -> u64 {
        let scaled = (self.base_delay_ms as f64 * cfg.recovery_floor_ratio).round() as u64;
        scaled.max(cfg.min_delay_ms)
    }

    fn clamp(&self, delay: u64, cfg: &GovernorConfig) -> u64 {
        delay.clamp(cfg.min_delay_ms, self.max_delay_ms(cfg))
    }

    /// Time until the next request may start.
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.last_request_at {
            Some(last) => {
                (last + Duration::from_millis(self.current_delay_ms)).saturating_duration_since(now)
            }
            None => Duration::ZERO,
        }
    }

    /// Claim the next start slot and return how long to wait for it.
    pub(crate) fn reserve(&mut self, now: Instant) -> Duration {
        let wait = self.wait_time(now);
        self.last_request_at = Some(now + wait);
        wait
    }

    /// Returns true when the delay changed.
    pub(crate) fn record_success(&mut self, cfg: &GovernorConfig) -> bool {
        self.success_streak += 1;
        if self.success_streak < cfg.success_threshold {
            return false;
        }
        self.success_streak = 0;

        let reduced = (self.current_delay_ms as f64 * cfg.success_reduction_factor).round() as u64;
        let next = reduced
            .max(self.recovery_floor_ms(cfg))
            .min(self.current_delay_ms);
        let changed = next != self.current_delay_ms;
        self.current_delay_ms = next;
        changed
    }

    pub(crate) fn record_throttled(&mut self, hint: Option<Duration>, cfg: &GovernorConfig) {
        self.success_streak = 0;
        let max_delay = self.max_delay_ms(cfg);
        let proposed = match hint {
            Some(hint) => {
                let hinted = hint.as_secs_f64() * 1000.0 + cfg.retry_hint_buffer_ms as f64;
                (hinted.ceil() as u64).min(max_delay)
            }
            None => {
                let doubled = (self.current_delay_ms as f64 * cfg.error_increase_factor).round();
                (doubled as u64).min(max_delay)
            }
        };
        self.current_delay_ms = self.clamp(proposed.max(self.current_delay_ms), cfg);
    }

    pub(crate) fn reset(&mut self) {
        self.current_delay_ms = self.base_delay_ms;
        self.success_streak = 0;
    }
}

/// Sole owner of every [`ThrottleState`].
///
/// Only reachable through the rate governor.
pub(crate) struct DelayStore {
    states: HashMap<ModelId, ThrottleState>,
    /// Delays loaded at startup for models not yet touched this session.
    persisted: DelayRecord,
    persistence: Arc<dyn DelayPersistence>,
}

impl DelayStore {
    /// Load the persisted record once; failures degrade to an empty record.
    pub(crate) fn open(persistence: Arc<dyn DelayPersistence>) -> Self {
        let persisted = match persistence.load() {
            Ok(record) => {
                debug!(models = record.len(), "Loaded persisted delays");
                record
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable delay store");
                DelayRecord::new()
            }
        };
        Self {
            states: HashMap::new(),
            persisted,
            persistence,
        }
    }

    pub(crate) fn get(&self, model: &ModelId) -> Option<&ThrottleState> {
        self.states.get(model)
    }

    pub(crate) fn get_or_create(
        &mut self,
        model: &ModelId,
        bases: &BaseDelays,
        cfg: &GovernorConfig,
    ) -> &mut ThrottleState {
        let persisted = self.persisted.get(model).copied();
        self.states
            .entry(model.clone())
            .or_insert_with(|| ThrottleState::new(bases.for_model(model), persisted, cfg))
    }

    pub(crate) fn states(&self) -> impl Iterator<Item = (&ModelId, &ThrottleState)> {
        self.states.iter()
    }

    pub(crate) fn states_mut(&mut self) -> impl Iterator<Item = &mut ThrottleState> {
        self.states.values_mut()
    }

    pub(crate) fn forget_persisted(&mut self, model: Option<&ModelId>) {
        match model {
            Some(model) => {
                self.persisted.remove(model);
            }
            None => self.persisted.clear(),
        }
    }

    /// Current delays for every model this store knows about.
    pub(crate) fn record(&self) -> DelayRecord {
        let mut record = self.persisted.clone();
        for (model, state) in &self.states {
            record.insert(model.clone(), state.current_delay_ms);
        }
        record
    }

    /// Write the record; failures are logged and swallowed.
    pub(crate) fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.record()) {
            warn!(error = %e, "Failed to persist adaptive delays; continuing in memory");
        }
    }
}
