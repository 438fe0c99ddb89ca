//! Column layout of the backing store.
//!
//! The sheet has fixed column semantics (A–K intake, L–Q treatment flags,
//! R–U secondary fields, V priority). The lock-state columns moved between
//! revisions of the sheet, so they are configurable.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::TriageError;

/// Last column a sheet can have (`XFD`).
pub const MAX_COLUMN_INDEX: usize = 16_384;

/// A spreadsheet column letter (`A`, `Q`, `AA`, ...), at most `XFD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Column(String);

impl Column {
    pub fn parse(letters: &str) -> Result<Self, TriageError> {
        let letters = letters.trim().to_ascii_uppercase();
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(TriageError::config(format!(
                "invalid column letter: {letters:?}"
            )));
        }
        match checked_col_index(&letters) {
            Some(idx) if idx <= MAX_COLUMN_INDEX => Ok(Self(letters)),
            _ => Err(TriageError::config(format!(
                "column {letters} is past the last sheet column XFD"
            ))),
        }
    }

    /// `A` -> 1, `Z` -> 26, `AA` -> 27.
    pub fn index(&self) -> usize {
        col_letter_to_index(&self.0)
    }

    /// Zero-based position inside a row.
    pub fn offset(&self) -> usize {
        self.index() - 1
    }

    pub fn from_index(idx: usize) -> Self {
        Self(index_to_col_letter(idx))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Column {
    type Error = TriageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Column::parse(&value)
    }
}

impl From<Column> for String {
    fn from(c: Column) -> Self {
        c.0
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `A` -> 1, `B` -> 2, ... (letters are assumed uppercase ASCII).
/// Saturates instead of overflowing; `Column::parse` bounds real input.
pub fn col_letter_to_index(letters: &str) -> usize {
    checked_col_index(letters).unwrap_or(usize::MAX)
}

fn checked_col_index(letters: &str) -> Option<usize> {
    letters.bytes().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?
            .checked_add(usize::from(b.checked_sub(b'A')?) + 1)
    })
}

/// 1 -> `A`, 27 -> `AA`. Zero yields an empty string.
pub fn index_to_col_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    while idx > 0 {
        let rem = (idx - 1) % 26;
        idx = (idx - 1) / 26;
        letters.push(b'A' + rem as u8);
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Inclusive column range (`A..=K`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub first: usize,
    pub last: usize,
}

impl ColumnRange {
    pub fn new(first: &str, last: &str) -> Self {
        Self {
            first: col_letter_to_index(first),
            last: col_letter_to_index(last),
        }
    }

    /// Zero-based offsets covered by the range.
    pub fn offsets(&self) -> std::ops::RangeInclusive<usize> {
        (self.first - 1)..=(self.last - 1)
    }
}

pub const INTAKE: (&str, &str) = ("A", "K");
pub const TREATMENT: (&str, &str) = ("L", "Q");
pub const SUMMARY: (&str, &str) = ("A", "C");
pub const SECONDARY: (&str, &str) = ("R", "U");

/// Where the lock-state fields of a case live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    /// Countdown duration (free-form, see `parse_seconds`).
    pub origin: Column,
    pub start_epoch: Column,
    pub deadline_epoch: Column,
    /// Last issued signed token.
    pub token: Column,
    pub expired_counter: Column,
    pub expiry_processed: Column,
    pub completed: Column,
    pub priority: Column,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            origin: Column("AA".into()),
            start_epoch: Column("W".into()),
            deadline_epoch: Column("X".into()),
            token: Column("Y".into()),
            expired_counter: Column("Z".into()),
            expiry_processed: Column("AB".into()),
            completed: Column("AC".into()),
            priority: Column("V".into()),
        }
    }
}

impl ColumnLayout {
    pub fn intake(&self) -> ColumnRange {
        ColumnRange::new(INTAKE.0, INTAKE.1)
    }

    pub fn treatment(&self) -> ColumnRange {
        ColumnRange::new(TREATMENT.0, TREATMENT.1)
    }

    pub fn summary(&self) -> ColumnRange {
        ColumnRange::new(SUMMARY.0, SUMMARY.1)
    }

    pub fn secondary(&self) -> ColumnRange {
        ColumnRange::new(SECONDARY.0, SECONDARY.1)
    }

    /// Widest column the layout touches; rows are padded at least this far.
    pub fn width(&self) -> usize {
        [
            &self.origin,
            &self.start_epoch,
            &self.deadline_epoch,
            &self.token,
            &self.expired_counter,
            &self.expiry_processed,
            &self.completed,
            &self.priority,
        ]
        .iter()
        .map(|c| c.index())
        .max()
        .unwrap_or(0)
        .max(col_letter_to_index(SECONDARY.1))
    }

    /// Lock-state columns must not overlap each other or the treatment flags.
    pub fn validate(&self) -> Result<(), TriageError> {
        let named = [
            ("origin", &self.origin),
            ("start_epoch", &self.start_epoch),
            ("deadline_epoch", &self.deadline_epoch),
            ("token", &self.token),
            ("expired_counter", &self.expired_counter),
            ("expiry_processed", &self.expiry_processed),
            ("completed", &self.completed),
            ("priority", &self.priority),
        ];
        for (i, (name_a, a)) in named.iter().enumerate() {
            for (name_b, b) in &named[i + 1..] {
                if a == b {
                    return Err(TriageError::config(format!(
                        "layout columns {name_a} and {name_b} both use {a}"
                    )));
                }
            }
            if self.treatment().offsets().contains(&a.offset()) {
                return Err(TriageError::config(format!(
                    "layout column {name_a} ({a}) overlaps the treatment flags L-Q"
                )));
            }
        }
        Ok(())
    }
}
