//! Deadline evaluation: the pure core of the lock state machine.
//!
//! These functions take the current time explicitly and never touch storage.
//! Persisting what they decide is the caller's job (see `app::service`).

use serde::{Deserialize, Serialize};

use super::state::LockState;

/// Countdown window of a case, all in Unix seconds. 0 means "absent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerWindow {
    pub origin_seconds: i64,
    pub start_epoch: i64,
    pub deadline_epoch: i64,
}

impl TimerWindow {
    pub fn new(origin_seconds: i64, start_epoch: i64, deadline_epoch: i64) -> Self {
        Self {
            origin_seconds: origin_seconds.max(0),
            start_epoch: start_epoch.max(0),
            deadline_epoch: deadline_epoch.max(0),
        }
    }

    /// Both start and deadline recorded.
    pub fn is_started(&self) -> bool {
        self.start_epoch > 0 && self.deadline_epoch > 0
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub remaining_seconds: i64,
    pub state: LockState,
}

impl Evaluation {
    pub fn is_editable(&self) -> bool {
        self.state.is_editable()
    }
}

/// Decide the lock state at `now`.
///
/// - completed wins over any timing (remaining is frozen at 0)
/// - no deadline: NotStarted, remaining is the configured origin
/// - `now <= deadline`: Running
/// - otherwise Expired
pub fn evaluate(now: i64, window: TimerWindow, completed: bool) -> Evaluation {
    if completed {
        return Evaluation {
            remaining_seconds: 0,
            state: LockState::Completed,
        };
    }
    if window.deadline_epoch <= 0 {
        return Evaluation {
            remaining_seconds: window.origin_seconds.max(0),
            state: LockState::NotStarted,
        };
    }
    if now <= window.deadline_epoch {
        Evaluation {
            remaining_seconds: window.deadline_epoch - now,
            state: LockState::Running,
        }
    } else {
        Evaluation {
            remaining_seconds: 0,
            state: LockState::Expired,
        }
    }
}

/// `evaluate` for a stored case. Once an expiry has been recorded the case
/// stays Expired, whatever window a later token or timer would offer.
/// Completed still wins.
pub fn evaluate_recorded(
    now: i64,
    window: TimerWindow,
    completed: bool,
    expiry_recorded: bool,
) -> Evaluation {
    if expiry_recorded && !completed {
        return Evaluation {
            remaining_seconds: 0,
            state: LockState::Expired,
        };
    }
    evaluate(now, window, completed)
}

/// Start the countdown if it has an origin and is not started yet.
///
/// Returns the window unchanged when `origin_seconds <= 0` or when both
/// start and deadline are already recorded. Otherwise fills in whichever of
/// the two is missing. Applying it to its own output is a no-op.
pub fn start_if_needed(window: TimerWindow, now: i64) -> TimerWindow {
    if window.origin_seconds <= 0 || window.is_started() {
        return window;
    }
    let start_epoch = if window.start_epoch > 0 {
        window.start_epoch
    } else {
        now
    };
    let deadline_epoch = if window.deadline_epoch > 0 {
        window.deadline_epoch
    } else {
        start_epoch.saturating_add(window.origin_seconds)
    };
    TimerWindow {
        origin_seconds: window.origin_seconds,
        start_epoch,
        deadline_epoch,
    }
}
