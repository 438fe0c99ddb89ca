//! ExpiryGuard - 期限切れの副作用（カウンター +1）を一度だけ実行する
//!
//! # 方針（at-most-once + 再試行）
//! - カウンターと処理済みフラグは 1 回の `write_cells` でまとめて書く
//! - 書き込みが成功して初めて手元の CaseRecord に反映する
//! - 失敗したら何も反映せず、次の観測で同じ判断をやり直す
//!
//! ストアの書き込みがアトミックである限り、二重計上も取りこぼしも起きない。

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::case::CaseRecord;
use crate::domain::events::DomainEvent;
use crate::domain::expiry::{ExpiryDecision, decide_expiry};
use crate::domain::layout::ColumnLayout;
use crate::domain::state::LockState;
use crate::domain::treatment::YES;
use crate::ports::{CaseStore, EventSink};

/// What one observation did about expiry.
///
/// `Failed` is not an error: the page still renders as locked and the
/// increment is retried on the next load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExpiryOutcome {
    NotExpired,
    AlreadyProcessed,
    Incremented { counter: u32 },
    Failed { reason: String },
}

#[derive(Clone)]
pub struct ExpiryGuard {
    store: Arc<dyn CaseStore>,
    events: Arc<dyn EventSink>,
    layout: ColumnLayout,
}

impl ExpiryGuard {
    pub fn new(store: Arc<dyn CaseStore>, events: Arc<dyn EventSink>, layout: ColumnLayout) -> Self {
        Self {
            store,
            events,
            layout,
        }
    }

    pub async fn observe(&self, case: &mut CaseRecord, state: LockState) -> ExpiryOutcome {
        let next_counter = match decide_expiry(state, case) {
            ExpiryDecision::NotExpired => return ExpiryOutcome::NotExpired,
            ExpiryDecision::AlreadyProcessed => return ExpiryOutcome::AlreadyProcessed,
            ExpiryDecision::Increment { next_counter } => next_counter,
        };

        let writes = [
            (self.layout.expired_counter.clone(), next_counter.to_string()),
            (self.layout.expiry_processed.clone(), YES.to_string()),
        ];
        match self.store.write_cells(case.row, &writes).await {
            Ok(()) => {
                case.mark_expiry_processed(&self.layout, next_counter);
                info!(row = %case.row, counter = next_counter, "case expired");
                self.events.emit(DomainEvent::Expired {
                    row: case.row,
                    counter: next_counter,
                });
                ExpiryOutcome::Incremented {
                    counter: next_counter,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(row = %case.row, error = %reason, "expiry write failed, will retry");
                self.events.emit(DomainEvent::ExpiryWriteFailed {
                    row: case.row,
                    reason: reason.clone(),
                });
                ExpiryOutcome::Failed { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::SheetRow;
    use crate::impls::{InMemoryCaseStore, RecordingEventSink};

    async fn setup(counter: &str) -> (Arc<InMemoryCaseStore>, Arc<RecordingEventSink>, ExpiryGuard, CaseRecord) {
        let layout = ColumnLayout::default();
        let store = Arc::new(InMemoryCaseStore::new(vec!["Name".into()]));
        let mut values = vec![String::new(); 29];
        values[0] = "Somchai".into();
        values[layout.expired_counter.offset()] = counter.into();
        let row = store.push_row(values.clone()).await;
        let events = Arc::new(RecordingEventSink::new());
        let guard = ExpiryGuard::new(store.clone(), events.clone(), layout.clone());
        let case = CaseRecord::from_row(&layout, row, vec!["Name".into()], values);
        (store, events, guard, case)
    }

    #[tokio::test]
    async fn increments_exactly_once() {
        let (store, events, guard, mut case) = setup("2").await;

        let first = guard.observe(&mut case, LockState::Expired).await;
        assert_eq!(first, ExpiryOutcome::Incremented { counter: 3 });
        assert_eq!(store.cell(SheetRow::new(2), "Z").await.as_deref(), Some("3"));
        assert_eq!(store.cell(SheetRow::new(2), "AB").await.as_deref(), Some("Yes"));

        let second = guard.observe(&mut case, LockState::Expired).await;
        assert_eq!(second, ExpiryOutcome::AlreadyProcessed);
        assert_eq!(store.write_count(), 1);
        assert_eq!(events.names(), vec!["expired"]);
    }

    #[tokio::test]
    async fn failed_write_leaves_case_untouched_and_retries() {
        let (store, events, guard, mut case) = setup("").await;
        store.fail_next_writes(1);

        let failed = guard.observe(&mut case, LockState::Expired).await;
        assert!(matches!(failed, ExpiryOutcome::Failed { .. }));
        assert!(!case.expiry_processed);
        assert_eq!(case.expired_counter, 0);
        assert_eq!(store.cell(SheetRow::new(2), "Z").await.as_deref(), Some(""));

        let retried = guard.observe(&mut case, LockState::Expired).await;
        assert_eq!(retried, ExpiryOutcome::Incremented { counter: 1 });
        assert_eq!(events.names(), vec!["expiry_write_failed", "expired"]);
    }

    #[tokio::test]
    async fn running_case_is_left_alone() {
        let (store, _events, guard, mut case) = setup("").await;
        assert_eq!(guard.observe(&mut case, LockState::Running).await, ExpiryOutcome::NotExpired);
        assert_eq!(store.write_count(), 0);
    }
}
