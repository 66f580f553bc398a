//! Per-attempt diagnostics.

use crate::{FailureClass, ModelId};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How a single provider attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum AttemptOutcome {
    /// The provider returned text
    #[display("success")]
    Success,
    /// The provider returned an error
    #[display("failure")]
    Failure,
}

/// One provider attempt inside an orchestrated call.
///
/// Records live only as long as the call chain that produced them; they feed
/// the attempt summary that is logged when the call finishes.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct AttemptRecord {
    /// Model the attempt targeted.
    model_id: ModelId,
    /// Wall-clock time the provider call started.
    started_at: DateTime<Utc>,
    /// Outcome of the attempt.
    outcome: AttemptOutcome,
    /// Classification of the failure, if it failed.
    failure_class: Option<FailureClass>,
    /// Time spent waiting on the rate governor before calling.
    waited_ms: u64,
}

impl AttemptRecord {
    /// Record a successful attempt.
    pub fn success(model_id: ModelId, started_at: DateTime<Utc>, waited: Duration) -> Self {
        Self {
            model_id,
            started_at,
            outcome: AttemptOutcome::Success,
            failure_class: None,
            waited_ms: duration_ms(waited),
        }
    }

    /// Record a failed attempt.
    pub fn failure(
        model_id: ModelId,
        started_at: DateTime<Utc>,
        class: FailureClass,
        waited: Duration,
    ) -> Self {
        Self {
            model_id,
            started_at,
            outcome: AttemptOutcome::Failure,
            failure_class: Some(class),
            waited_ms: duration_ms(waited),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
