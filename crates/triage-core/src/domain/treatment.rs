//! Treatment checklist (columns L–Q).

use serde::{Deserialize, Serialize};

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Number of treatment flags on the form.
pub const FLAG_COUNT: usize = 6;

/// `"yes"` in any case is Yes, anything else is No.
pub fn parse_yes_no(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(YES)
}

pub fn yes_no(value: bool) -> &'static str {
    if value { YES } else { NO }
}

/// Generic truthy cell reading for stored flags (`Yes`, `TRUE`, `1`).
pub fn parse_flag(raw: &str) -> bool {
    let s = raw.trim();
    s.eq_ignore_ascii_case(YES) || s.eq_ignore_ascii_case("true") || s == "1"
}

/// One named yes/no checkbox; the name is the column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentFlag {
    pub name: String,
    pub checked: bool,
}

/// Ordered treatment flags as they appear in L–Q.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentFlags(Vec<TreatmentFlag>);

impl TreatmentFlags {
    /// Build from `(header, raw value)` pairs; at most `FLAG_COUNT` are kept.
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self(
            cells
                .into_iter()
                .take(FLAG_COUNT)
                .map(|(name, raw)| TreatmentFlag {
                    name: name.to_string(),
                    checked: parse_yes_no(raw),
                })
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreatmentFlag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.iter().find(|f| f.name == name).map(|f| f.checked)
    }

    /// Mirror a saved flag. Unknown names are ignored.
    pub fn set(&mut self, name: &str, checked: bool) {
        if let Some(flag) = self.0.iter_mut().find(|f| f.name == name) {
            flag.checked = checked;
        }
    }
}
