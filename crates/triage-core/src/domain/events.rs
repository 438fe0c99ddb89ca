//! Events - ドメインイベント
//!
//! 状態が変わった瞬間、または協調先が失敗した瞬間に発行されます。
//! 送信先は `ports::EventSink`。

use serde::Serialize;

use super::ids::SheetRow;
use super::priority::Priority;

/// DomainEvent はドメインで発生したイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Start and deadline were written for the first time.
    TimerStarted {
        row: SheetRow,
        start_epoch: i64,
        deadline_epoch: i64,
    },

    /// The expired counter was incremented (once per case).
    Expired { row: SheetRow, counter: u32 },

    /// The expiry write failed; it will be retried on the next observation.
    ExpiryWriteFailed { row: SheetRow, reason: String },

    /// Treatment checklist saved.
    TreatmentRecorded { row: SheetRow, flags: usize },

    /// Priority saved; the case is closed for editing.
    Completed { row: SheetRow, priority: Priority },

    /// The external timer service failed and the store was used instead.
    TimerServiceFallback { row: SheetRow, reason: String },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::TimerStarted { .. } => "timer_started",
            DomainEvent::Expired { .. } => "expired",
            DomainEvent::ExpiryWriteFailed { .. } => "expiry_write_failed",
            DomainEvent::TreatmentRecorded { .. } => "treatment_recorded",
            DomainEvent::Completed { .. } => "completed",
            DomainEvent::TimerServiceFallback { .. } => "timer_service_fallback",
        }
    }

    pub fn row(&self) -> SheetRow {
        match self {
            DomainEvent::TimerStarted { row, .. }
            | DomainEvent::Expired { row, .. }
            | DomainEvent::ExpiryWriteFailed { row, .. }
            | DomainEvent::TreatmentRecorded { row, .. }
            | DomainEvent::Completed { row, .. }
            | DomainEvent::TimerServiceFallback { row, .. } => *row,
        }
    }
}
