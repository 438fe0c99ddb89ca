//! Triage priority (column V).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Priority 1")]
    P1,
    #[serde(rename = "Priority 2")]
    P2,
    #[serde(rename = "Priority 3")]
    P3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::P1, Priority::P2, Priority::P3];

    pub fn label(self) -> &'static str {
        match self {
            Priority::P1 => "Priority 1",
            Priority::P2 => "Priority 2",
            Priority::P3 => "Priority 3",
        }
    }

    /// Exact stored label only; anything else reads as "no priority yet".
    pub fn from_cell(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == raw.trim())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the stored labels and the `1`/`2`/`3` shorthands.
impl FromStr for Priority {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Priority::P1),
            "2" => Ok(Priority::P2),
            "3" => Ok(Priority::P3),
            other => Priority::from_cell(other).ok_or_else(|| {
                TriageError::input(format!(
                    "unknown priority {other:?} (expected Priority 1, Priority 2 or Priority 3)"
                ))
            }),
        }
    }
}
