//! EventSink の実装
//!
//! - TracingEventSink: tracing に構造化ログとして出す（デフォルト）
//! - RecordingEventSink: テスト用にメモリへ溜める

use std::sync::Mutex;

use tracing::{info, warn};

use crate::domain::events::DomainEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DomainEvent) {
        let row = event.row().get();
        let name = event.name();
        match &event {
            DomainEvent::ExpiryWriteFailed { reason, .. }
            | DomainEvent::TimerServiceFallback { reason, .. } => {
                warn!(event = name, row, reason = %reason, "triage event");
            }
            _ => {
                let detail = serde_json::to_string(&event).unwrap_or_default();
                info!(event = name, row, detail = %detail, "triage event");
            }
        }
    }
}

/// Keeps every event in order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(DomainEvent::name).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
