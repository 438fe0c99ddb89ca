//! Lock state machine for a case's editing session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lock state of a case.
///
/// State transitions:
/// - NotStarted -> Running (deadline written on first read with origin > 0)
/// - Running -> Expired (now passes the deadline without completion)
/// - NotStarted | Running -> Completed (priority submission recorded)
///
/// Expired and Completed are terminal for the editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    /// No deadline recorded; the countdown has not begun.
    NotStarted,

    /// Deadline recorded and not yet passed.
    Running,

    /// Deadline passed without completion.
    Expired,

    /// Terminal action recorded.
    Completed,
}

impl LockState {
    /// Can the form still be edited?
    pub fn is_editable(self) -> bool {
        matches!(self, LockState::NotStarted | LockState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LockState::NotStarted => "NOT_STARTED",
            LockState::Running => "RUNNING",
            LockState::Expired => "EXPIRED",
            LockState::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
