//! Expiry decision: whether the one-time "expired" side effect must fire.
//!
//! Pure function, same shape as a decider: given the evaluated state and the
//! persisted case, return what to do. Executing it is `app::expiry`.

use serde::{Deserialize, Serialize};

use super::case::CaseRecord;
use super::state::LockState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ExpiryDecision {
    /// The case is not expired; nothing to do.
    NotExpired,

    /// Already counted in an earlier observation.
    AlreadyProcessed,

    /// First observation of expiry: write `next_counter` and the flag together.
    Increment { next_counter: u32 },
}

pub fn decide_expiry(state: LockState, case: &CaseRecord) -> ExpiryDecision {
    if state != LockState::Expired {
        return ExpiryDecision::NotExpired;
    }
    if case.expiry_processed {
        return ExpiryDecision::AlreadyProcessed;
    }
    ExpiryDecision::Increment {
        next_counter: case.expired_counter.saturating_add(1),
    }
}
