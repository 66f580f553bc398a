//! Retry and fallback decisions for one orchestrated call.
//!
//! ```text
//! Pending -> Waiting -> Calling -> Succeeded
//!               ^          |
//!               |          +-> Retrying ----+  (same candidate)
//!               |          +-> FallingBack -+  (next candidate)
//!               +--------------------------+
//!                          +-> Failed
//! ```
//!
//! [`plan_transition`] is the whole decision table for failures. The
//! orchestrator only executes what it returns.

use remark_core::FailureClass;

/// Where an orchestrated call is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CallState {
    /// Candidate list built, nothing attempted yet
    Pending,
    /// Waiting on the rate governor for the current candidate
    Waiting,
    /// Provider call in flight
    Calling,
    /// A candidate returned text
    Succeeded,
    /// About to wait again on the same candidate
    Retrying,
    /// About to wait on the next candidate
    FallingBack,
    /// No further attempts will be made
    Failed,
}

impl CallState {
    /// Terminal states are final: nothing is retried after reaching one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Succeeded | CallState::Failed)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// `Retrying`, `FallingBack` or `Failed`
    pub next: CallState,
    /// Whether the failure slows down future requests to the candidate
    pub throttle: bool,
}

/// Decide the next state after a failed attempt.
///
/// - `has_next_candidate`: another model follows the current one
/// - `retries_left`: the same-model retry budget is not used up
///
/// # Examples
///
/// ```
/// use remark_core::FailureClass;
/// use remark_orchestrator::{CallState, plan_transition};
///
/// let t = plan_transition(FailureClass::RateLimited, true, true);
/// assert_eq!(t.next, CallState::FallingBack);
/// assert!(t.throttle);
///
/// let t = plan_transition(FailureClass::InvalidCredential, true, true);
/// assert_eq!(t.next, CallState::Failed);
/// ```
pub fn plan_transition(
    class: FailureClass,
    has_next_candidate: bool,
    retries_left: bool,
) -> Transition {
    let (next, throttle) = match class {
        // A bad key for one provider says nothing about the next one.
        FailureClass::InvalidCredential => (CallState::Failed, false),
        FailureClass::RateLimited | FailureClass::QuotaExceeded | FailureClass::Transient => {
            let next = if has_next_candidate {
                CallState::FallingBack
            } else if retries_left {
                CallState::Retrying
            } else {
                CallState::Failed
            };
            (next, true)
        }
        FailureClass::ModelUnavailable => {
            let next = if has_next_candidate {
                CallState::FallingBack
            } else {
                CallState::Failed
            };
            (next, false)
        }
        FailureClass::Unknown => {
            let next = if retries_left {
                CallState::Retrying
            } else if has_next_candidate {
                CallState::FallingBack
            } else {
                CallState::Failed
            };
            (next, false)
        }
    };
    Transition { next, throttle }
}
