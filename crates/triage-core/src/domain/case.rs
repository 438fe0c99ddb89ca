//! Case record: one row of the backing store, decoded.

use serde::Serialize;

use super::duration::{parse_epoch, parse_seconds};
use super::evaluation::TimerWindow;
use super::ids::SheetRow;
use super::layout::{Column, ColumnLayout};
use super::priority::Priority;
use super::treatment::{TreatmentFlags, parse_flag, yes_no};

/// A decoded case row.
///
/// Design:
/// - The raw `headers`/`values` are kept so projections read exactly what
///   the store holds.
/// - Typed fields are decoded once; malformed cells become 0/false/None.
/// - The `mark_*` methods mirror writes that already succeeded in the
///   store, so an in-memory copy never runs ahead of persisted state.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub row: SheetRow,
    pub headers: Vec<String>,
    pub values: Vec<String>,

    /// The origin cell as typed, before parsing.
    pub origin_raw: String,
    pub window: TimerWindow,

    pub completed: bool,
    pub expired_counter: u32,

    /// Set in the same write as the counter increment.
    pub expiry_processed: bool,

    pub priority: Option<Priority>,
    pub treatment: TreatmentFlags,
    pub token: Option<String>,
}

impl CaseRecord {
    pub fn from_row(
        layout: &ColumnLayout,
        row: SheetRow,
        headers: Vec<String>,
        mut values: Vec<String>,
    ) -> Self {
        let width = headers.len().max(layout.width());
        if values.len() < width {
            values.resize(width, String::new());
        }

        let cell = |c: &Column| values.get(c.offset()).map(String::as_str).unwrap_or("");

        let origin_raw = cell(&layout.origin).to_string();
        let window = TimerWindow::new(
            parse_seconds(origin_raw.as_str()),
            parse_epoch(cell(&layout.start_epoch)),
            parse_epoch(cell(&layout.deadline_epoch)),
        );
        let completed = parse_flag(cell(&layout.completed));
        let expired_counter = parse_counter(cell(&layout.expired_counter));
        let expiry_processed = parse_flag(cell(&layout.expiry_processed));
        let priority = Priority::from_cell(cell(&layout.priority));
        let token = Some(cell(&layout.token).trim().to_string()).filter(|t| !t.is_empty());

        let treatment = TreatmentFlags::from_cells(layout.treatment().offsets().filter_map(|i| {
            let header = headers.get(i)?;
            Some((header.as_str(), values.get(i).map(String::as_str).unwrap_or("")))
        }));

        Self {
            row,
            headers,
            values,
            origin_raw,
            window,
            completed,
            expired_counter,
            expiry_processed,
            priority,
            treatment,
            token,
        }
    }

    pub fn cell(&self, column: &Column) -> &str {
        self.values
            .get(column.offset())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Offset of the column whose header is exactly `name`.
    pub fn column_for_header(&self, name: &str) -> Option<Column> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| Column::from_index(i + 1))
    }

    /// Mirror a successful cell write.
    pub fn set_cell(&mut self, column: &Column, value: impl Into<String>) {
        let offset = column.offset();
        if self.values.len() <= offset {
            self.values.resize(offset + 1, String::new());
        }
        self.values[offset] = value.into();
    }

    /// Mirror a successful treatment flag write.
    pub fn mark_treatment(&mut self, column: &Column, name: &str, checked: bool) {
        self.set_cell(column, yes_no(checked));
        self.treatment.set(name, checked);
    }

    /// Mirror a successful start write.
    pub fn apply_window(&mut self, layout: &ColumnLayout, window: TimerWindow) {
        self.window = window;
        self.set_cell(&layout.start_epoch, window.start_epoch.to_string());
        self.set_cell(&layout.deadline_epoch, window.deadline_epoch.to_string());
    }

    /// Mirror a successful expiry write (counter + processed flag).
    pub fn mark_expiry_processed(&mut self, layout: &ColumnLayout, counter: u32) {
        self.expired_counter = counter;
        self.expiry_processed = true;
        self.set_cell(&layout.expired_counter, counter.to_string());
        self.set_cell(&layout.expiry_processed, "Yes");
    }

    /// Mirror a successful priority submission.
    pub fn mark_completed(&mut self, layout: &ColumnLayout, priority: Priority) {
        self.priority = Some(priority);
        self.completed = true;
        self.set_cell(&layout.priority, priority.label());
        self.set_cell(&layout.completed, "Yes");
    }
}

/// Non-negative whole number; anything else counts as 0.
pub fn parse_counter(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}
