//! Per-session flags, passed explicitly into every service call.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// The treatment checklist was submitted; the next edit1 load shows the
    /// priority step instead.
    pub treated: bool,

    /// The lock source has been told the case completed.
    pub timer_stopped: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}
