//! Form modes and the field projections each mode shows.
//!
//! A projection is a stateless mapping from a mode to `(header, value)`
//! pairs in column order. Columns past the end of the row read as "".

use serde::{Deserialize, Serialize};
use std::fmt;

use super::case::CaseRecord;
use super::layout::{ColumnLayout, ColumnRange};
use super::treatment::yes_no;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    /// Intake A–K plus the treatment checklist L–Q.
    Edit1,
    /// Summary A–C, secondary R–U and the priority selection.
    Edit2,
    /// Summary A–C and R–V, read only.
    View,
}

impl FormMode {
    /// Unknown or missing modes fall back to `edit1`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "edit2" => FormMode::Edit2,
            "view" => FormMode::View,
            _ => FormMode::Edit1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormMode::Edit1 => "edit1",
            FormMode::Edit2 => "edit2",
            FormMode::View => "view",
        }
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    pub value: String,
}

/// Fields shown for a mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub mode: Option<FormMode>,
    /// Read-only display fields.
    pub fields: Vec<Field>,
    /// Editable checklist (edit1 only), values normalised to Yes/No.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<Field>,
    /// Current priority (edit2 only); cells outside the allowed labels read as none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_priority: Option<String>,
}

impl Projection {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .chain(self.checklist.iter())
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

fn slice(headers: &[String], values: &[String], range: ColumnRange) -> Vec<Field> {
    range
        .offsets()
        .filter_map(|i| {
            headers.get(i).map(|h| Field {
                label: h.clone(),
                value: values.get(i).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// Project a case for `mode`.
pub fn project(mode: FormMode, layout: &ColumnLayout, case: &CaseRecord) -> Projection {
    let headers = &case.headers;
    let values = &case.values;
    match mode {
        FormMode::Edit1 => Projection {
            mode: Some(mode),
            fields: slice(headers, values, layout.intake()),
            checklist: case
                .treatment
                .iter()
                .map(|f| Field {
                    label: f.name.clone(),
                    value: yes_no(f.checked).to_string(),
                })
                .collect(),
            current_priority: None,
        },
        FormMode::Edit2 => {
            let mut fields = slice(headers, values, layout.summary());
            fields.extend(slice(headers, values, layout.secondary()));
            Projection {
                mode: Some(mode),
                fields,
                checklist: Vec::new(),
                current_priority: case.priority.map(|p| p.label().to_string()),
            }
        }
        FormMode::View => {
            let mut fields = slice(headers, values, layout.summary());
            fields.extend(slice(headers, values, layout.secondary()));
            let priority_offset = layout.priority.offset();
            if let Some(label) = headers.get(priority_offset) {
                fields.push(Field {
                    label: label.clone(),
                    value: case.cell(&layout.priority).to_string(),
                });
            }
            Projection {
                mode: Some(mode),
                fields,
                checklist: Vec::new(),
                current_priority: None,
            }
        }
    }
}
