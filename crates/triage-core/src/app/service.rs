//! TriageService - ページ読み込みと送信の処理
//!
//! 1 回のページ読み込み（observe）は次の順で進む:
//! 1. ストアからケース行を読む
//! 2. 完了済みでも期限切れ記録済みでもなければ LockSource で窓を解決し、
//!    新しく開始したら書き込む
//! 3. `evaluate_recorded` で状態を決める（記録済みの期限切れは覆らない）
//! 4. ExpiryGuard が期限切れの副作用を一度だけ実行する
//!
//! 送信（treatment / priority）は同じ observe を行い、編集不可なら Locked を返す。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::expiry::{ExpiryGuard, ExpiryOutcome};
use crate::app::session::SessionState;
use crate::app::status::StatusView;
use crate::domain::case::CaseRecord;
use crate::domain::duration::fmt_hms;
use crate::domain::errors::TriageError;
use crate::domain::evaluation::{Evaluation, evaluate, evaluate_recorded};
use crate::domain::events::DomainEvent;
use crate::domain::form::{FormMode, Projection, project};
use crate::domain::ids::PageRow;
use crate::domain::layout::{Column, ColumnLayout};
use crate::domain::priority::Priority;
use crate::domain::state::LockState;
use crate::domain::token::TokenClaims;
use crate::domain::treatment::{YES, yes_no};
use crate::impls::hmac_token::TokenSigner;
use crate::ports::{CaseStore, CellWrites, Clock, EventSink, LockRequest, LockSource, LockVariant};

/// What a page load shows.
#[derive(Debug, Clone, Serialize)]
pub struct CaseView {
    pub row: PageRow,
    pub state: LockState,
    pub remaining_seconds: i64,
    pub remaining_hms: String,
    pub origin_seconds: i64,
    pub editable: bool,
    /// Mode actually rendered (locked cases are forced to `view`).
    pub mode: FormMode,
    pub projection: Projection,
    pub expiry: ExpiryOutcome,
    /// Lock variant that produced the window; `None` for completed cases
    /// and cases whose expiry is already recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LockVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// A freshly issued case token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub row: PageRow,
    pub token: String,
    pub exp: i64,
    pub recorded: bool,
}

/// One observation of a case, before projection.
struct Observed {
    case: CaseRecord,
    evaluation: Evaluation,
    expiry: ExpiryOutcome,
    source: Option<LockVariant>,
    fallback_reason: Option<String>,
}

/// Token signing settings.
pub struct TokenIssuer {
    pub signer: Arc<TokenSigner>,
    pub ttl_secs: i64,
}

pub struct TriageService {
    pub(crate) store: Arc<dyn CaseStore>,
    pub(crate) lock: Arc<dyn LockSource>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) layout: ColumnLayout,
    pub(crate) issuer: Option<TokenIssuer>,
    pub(crate) expiry: ExpiryGuard,
}

impl TriageService {
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn lock_variant(&self) -> LockVariant {
        self.lock.variant()
    }

    /// Load a case page.
    ///
    /// `mode` is what the page asked for; a locked case is always shown in
    /// `view`, and an edit1 request right after a treatment submission in
    /// this session shows edit2.
    pub async fn open_case(
        &self,
        row: PageRow,
        mode: FormMode,
        token: Option<&str>,
        session: &mut SessionState,
    ) -> Result<CaseView, TriageError> {
        let observed = self.observe(row, token).await?;
        if observed.evaluation.state == LockState::Completed {
            self.notify_completed(row, session).await;
        }

        let mode = match mode {
            _ if !observed.evaluation.is_editable() => FormMode::View,
            FormMode::Edit1 if session.treated => FormMode::Edit2,
            other => other,
        };
        Ok(self.view(row, mode, observed))
    }

    /// Save the treatment checklist. Names are matched against the L-Q
    /// headers; unknown names are ignored.
    pub async fn submit_treatment(
        &self,
        row: PageRow,
        selections: &BTreeMap<String, bool>,
        token: Option<&str>,
        session: &mut SessionState,
    ) -> Result<CaseView, TriageError> {
        let mut observed = self.observe_editable(row, token).await?;

        let treatment = self.layout.treatment();
        let matched: Vec<(&str, Column, bool)> = selections
            .iter()
            .filter_map(|(name, checked)| {
                let column = observed.case.column_for_header(name)?;
                treatment
                    .offsets()
                    .contains(&column.offset())
                    .then(|| (name.as_str(), column, *checked))
            })
            .collect();
        let writes: CellWrites = matched
            .iter()
            .map(|(_, column, checked)| (column.clone(), yes_no(*checked).to_string()))
            .collect();

        if writes.is_empty() {
            debug!(row = %row, "no known treatment flags in submission");
        } else {
            self.store.write_cells(observed.case.row, &writes).await?;
            for (name, column, checked) in &matched {
                observed.case.mark_treatment(column, name, *checked);
            }
        }
        info!(row = %row, flags = writes.len(), "treatment recorded");
        self.events.emit(DomainEvent::TreatmentRecorded {
            row: observed.case.row,
            flags: writes.len(),
        });

        session.treated = true;
        Ok(self.view(row, FormMode::Edit2, observed))
    }

    /// Save the priority and close the case.
    pub async fn submit_priority(
        &self,
        row: PageRow,
        priority: Priority,
        token: Option<&str>,
        session: &mut SessionState,
    ) -> Result<CaseView, TriageError> {
        let mut observed = self.observe_editable(row, token).await?;

        let writes = [
            (self.layout.priority.clone(), priority.label().to_string()),
            (self.layout.completed.clone(), YES.to_string()),
        ];
        self.store.write_cells(observed.case.row, &writes).await?;
        observed.case.mark_completed(&self.layout, priority);
        info!(row = %row, priority = %priority, "case completed");
        self.events.emit(DomainEvent::Completed {
            row: observed.case.row,
            priority,
        });

        observed.evaluation = evaluate(self.clock.epoch_seconds(), observed.case.window, true);
        session.treated = false;
        self.notify_completed(row, session).await;
        Ok(self.view(row, FormMode::View, observed))
    }

    /// Issue a signed token for `row`, valid for the configured TTL.
    /// With `record`, it is also written to the token column.
    pub async fn issue_token(&self, row: PageRow, record: bool) -> Result<IssuedToken, TriageError> {
        let issuer = self
            .issuer
            .as_ref()
            .ok_or_else(|| TriageError::config("no token secret configured"))?;
        let exp = self.clock.epoch_seconds().saturating_add(issuer.ttl_secs);
        let token = issuer.signer.issue(TokenClaims::new(row.get(), exp));

        if record {
            let writes = [(self.layout.token.clone(), token.clone())];
            self.store.write_cells(row.to_sheet_row(), &writes).await?;
        }
        info!(row = %row, exp, recorded = record, "token issued");
        Ok(IssuedToken {
            row,
            token,
            exp,
            recorded: record,
        })
    }

    /// Read-only diagnostics from the stored window.
    pub async fn status(&self, row: PageRow) -> Result<StatusView, TriageError> {
        let case = self.load(row).await?;
        Ok(StatusView::from_case(
            row,
            &case,
            &self.layout,
            self.store.name(),
            self.lock.variant(),
            self.clock.epoch_seconds(),
        ))
    }

    async fn load(&self, row: PageRow) -> Result<CaseRecord, TriageError> {
        let sheet_row = row.to_sheet_row();
        let headers = self.store.headers().await?;
        let values = self.store.read_row(sheet_row).await?;
        Ok(CaseRecord::from_row(&self.layout, sheet_row, headers, values))
    }

    async fn observe(&self, row: PageRow, token: Option<&str>) -> Result<Observed, TriageError> {
        let mut case = self.load(row).await?;
        let now = self.clock.epoch_seconds();

        let mut source = None;
        let mut fallback_reason = None;
        if !case.completed && !case.expiry_processed {
            let request = LockRequest {
                case: &case,
                page_row: row,
                token,
                now,
            };
            let resolution = self.lock.resolve(&request).await?;

            if let Some(reason) = &resolution.fallback_reason {
                self.events.emit(DomainEvent::TimerServiceFallback {
                    row: case.row,
                    reason: reason.clone(),
                });
            }
            if resolution.persist {
                let window = resolution.window;
                let writes = [
                    (self.layout.start_epoch.clone(), window.start_epoch.to_string()),
                    (self.layout.deadline_epoch.clone(), window.deadline_epoch.to_string()),
                ];
                self.store.write_cells(case.row, &writes).await?;
                case.apply_window(&self.layout, window);
                info!(
                    row = %row,
                    start_epoch = window.start_epoch,
                    deadline_epoch = window.deadline_epoch,
                    "timer started"
                );
                self.events.emit(DomainEvent::TimerStarted {
                    row: case.row,
                    start_epoch: window.start_epoch,
                    deadline_epoch: window.deadline_epoch,
                });
            } else {
                case.window = resolution.window;
            }
            source = Some(resolution.source);
            fallback_reason = resolution.fallback_reason;
        }

        let evaluation = evaluate_recorded(now, case.window, case.completed, case.expiry_processed);
        let expiry = self.expiry.observe(&mut case, evaluation.state).await;
        debug!(
            row = %row,
            state = %evaluation.state,
            remaining = evaluation.remaining_seconds,
            "case observed"
        );

        Ok(Observed {
            case,
            evaluation,
            expiry,
            source,
            fallback_reason,
        })
    }

    async fn observe_editable(&self, row: PageRow, token: Option<&str>) -> Result<Observed, TriageError> {
        let observed = self.observe(row, token).await?;
        if !observed.evaluation.is_editable() {
            return Err(TriageError::Locked {
                row: observed.case.row,
                state: observed.evaluation.state,
            });
        }
        Ok(observed)
    }

    async fn notify_completed(&self, row: PageRow, session: &mut SessionState) {
        if session.timer_stopped {
            return;
        }
        match self.lock.on_completed(row).await {
            Ok(()) => session.timer_stopped = true,
            Err(e) => warn!(row = %row, error = %e, "could not notify lock source of completion"),
        }
    }

    fn view(&self, row: PageRow, mode: FormMode, observed: Observed) -> CaseView {
        let Observed {
            case,
            evaluation,
            expiry,
            source,
            fallback_reason,
        } = observed;
        CaseView {
            row,
            state: evaluation.state,
            remaining_seconds: evaluation.remaining_seconds,
            remaining_hms: fmt_hms(evaluation.remaining_seconds),
            origin_seconds: case.window.origin_seconds,
            editable: evaluation.is_editable(),
            mode,
            projection: project(mode, &self.layout, &case),
            expiry,
            source,
            fallback_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::builder::AppBuilder;
    use crate::domain::errors::ErrorKind;
    use crate::domain::ids::SheetRow;
    use crate::domain::token::TokenError;
    use crate::impls::lock_sources::tests::ScriptedTimer;
    use crate::impls::{
        InMemoryCaseStore, RecordingEventSink, SignedTokenLock, TimerServiceLock, TokenSigner,
    };
    use crate::ports::FixedClock;

    const T0: i64 = 1_700_000_000;

    fn headers() -> Vec<String> {
        let mut h: Vec<String> = (1..=29)
            .map(|i| format!("H{}", Column::from_index(i)))
            .collect();
        h[0] = "Name".into();
        h[1] = "Age".into();
        h[11] = "Oxygen".into();
        h[12] = "IV fluids".into();
        h[21] = "Priority".into();
        h
    }

    struct Harness {
        store: Arc<InMemoryCaseStore>,
        clock: Arc<FixedClock>,
        events: Arc<RecordingEventSink>,
        service: TriageService,
    }

    async fn harness_with(origin: &str, lock: Option<Arc<dyn LockSource>>) -> Harness {
        let store = Arc::new(InMemoryCaseStore::new(headers()));
        let mut values = vec![String::new(); 29];
        values[0] = "Somchai".into();
        values[1] = "41".into();
        values[ColumnLayout::default().origin.offset()] = origin.into();
        store.push_row(values).await;

        let clock = Arc::new(FixedClock::at_epoch(T0));
        let events = Arc::new(RecordingEventSink::new());
        let mut builder = AppBuilder::new()
            .store(store.clone())
            .clock(clock.clone())
            .events(events.clone())
            .token_issuer(Arc::new(TokenSigner::new(b"ward")), 600);
        builder = match lock {
            Some(lock) => builder.lock_source(lock),
            None => builder.lock_source(Arc::new(crate::impls::EpochPairLock)),
        };
        Harness {
            store,
            clock,
            events,
            service: builder.build().unwrap(),
        }
    }

    async fn harness(origin: &str) -> Harness {
        harness_with(origin, None).await
    }

    fn page_row() -> PageRow {
        PageRow::new(1)
    }

    fn sheet_row() -> SheetRow {
        SheetRow::new(2)
    }

    #[tokio::test]
    async fn first_load_starts_the_timer() {
        let h = harness("120").await;
        let mut session = SessionState::new();

        let view = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(view.state, LockState::Running);
        assert_eq!(view.remaining_seconds, 120);
        assert_eq!(view.remaining_hms, "00:02:00");
        assert!(view.editable);
        assert_eq!(view.mode, FormMode::Edit1);
        assert_eq!(view.projection.get("Name"), Some("Somchai"));
        assert_eq!(view.source, Some(LockVariant::EpochPair));

        assert_eq!(h.store.cell(sheet_row(), "W").await.as_deref(), Some("1700000000"));
        assert_eq!(h.store.cell(sheet_row(), "X").await.as_deref(), Some("1700000120"));
        assert_eq!(h.events.names(), vec!["timer_started"]);
    }

    #[tokio::test]
    async fn reload_does_not_restart() {
        let h = harness("120").await;
        let mut session = SessionState::new();
        h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();

        h.clock.advance(50);
        let view = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(view.remaining_seconds, 70);
        assert_eq!(h.store.cell(sheet_row(), "X").await.as_deref(), Some("1700000120"));
        assert_eq!(h.store.write_count(), 1);
    }

    #[tokio::test]
    async fn expiry_counts_once_across_reloads() {
        let h = harness("120").await;
        let mut session = SessionState::new();
        h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();

        h.clock.set_epoch(T0 + 120);
        let at_deadline = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(at_deadline.state, LockState::Running);
        assert_eq!(at_deadline.remaining_seconds, 0);

        h.clock.set_epoch(T0 + 121);
        let expired = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(expired.state, LockState::Expired);
        assert_eq!(expired.expiry, ExpiryOutcome::Incremented { counter: 1 });
        assert_eq!(expired.mode, FormMode::View);
        assert!(!expired.editable);
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some("1"));

        h.clock.set_epoch(T0 + 130);
        let again = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(again.expiry, ExpiryOutcome::AlreadyProcessed);
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some("1"));
        assert_eq!(h.events.names(), vec!["timer_started", "expired"]);
    }

    #[tokio::test]
    async fn failed_expiry_write_is_retried_next_load() {
        let h = harness("60").await;
        let mut session = SessionState::new();
        h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();

        h.clock.advance(61);
        h.store.fail_next_writes(1);
        let failed = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(failed.state, LockState::Expired);
        assert!(matches!(failed.expiry, ExpiryOutcome::Failed { .. }));
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some(""));
        assert_eq!(h.store.cell(sheet_row(), "AB").await.as_deref(), Some(""));

        let retried = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(retried.expiry, ExpiryOutcome::Incremented { counter: 1 });
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn unusable_origin_never_starts() {
        let h = harness("Yes").await;
        let mut session = SessionState::new();
        let view = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(view.state, LockState::NotStarted);
        assert_eq!(view.remaining_seconds, 0);
        assert!(view.editable);
        assert_eq!(h.store.write_count(), 0);

        let status = h.service.status(page_row()).await.unwrap();
        assert!(status.hint.is_some());
    }

    #[tokio::test]
    async fn treatment_then_priority_completes() {
        let h = harness("120").await;
        let mut session = SessionState::new();

        let selections = BTreeMap::from([
            ("Oxygen".to_string(), true),
            ("IV fluids".to_string(), false),
            ("Name".to_string(), true),
            ("Unknown".to_string(), true),
        ]);
        let view = h
            .service
            .submit_treatment(page_row(), &selections, None, &mut session)
            .await
            .unwrap();
        assert_eq!(view.mode, FormMode::Edit2);
        assert!(session.treated);
        assert_eq!(h.store.cell(sheet_row(), "L").await.as_deref(), Some("Yes"));
        assert_eq!(h.store.cell(sheet_row(), "M").await.as_deref(), Some("No"));
        assert_eq!(h.store.cell(sheet_row(), "A").await.as_deref(), Some("Somchai"));

        let edit1 = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(edit1.mode, FormMode::Edit2);

        let other_session = h
            .service
            .open_case(page_row(), FormMode::Edit1, None, &mut SessionState::new())
            .await
            .unwrap();
        assert_eq!(other_session.projection.get("Oxygen"), Some("Yes"));
        assert_eq!(other_session.projection.get("IV fluids"), Some("No"));

        let done = h
            .service
            .submit_priority(page_row(), Priority::P2, None, &mut session)
            .await
            .unwrap();
        assert_eq!(done.state, LockState::Completed);
        assert_eq!(done.mode, FormMode::View);
        assert_eq!(done.projection.get("Priority"), Some("Priority 2"));
        assert!(!session.treated);
        assert!(session.timer_stopped);
        assert_eq!(h.store.cell(sheet_row(), "V").await.as_deref(), Some("Priority 2"));
        assert_eq!(h.store.cell(sheet_row(), "AC").await.as_deref(), Some("Yes"));
        assert_eq!(
            h.events.names(),
            vec!["timer_started", "treatment_recorded", "completed"]
        );
    }

    #[tokio::test]
    async fn completed_case_stays_completed_past_deadline() {
        let h = harness("60").await;
        let mut session = SessionState::new();
        h.service
            .submit_priority(page_row(), Priority::P1, None, &mut session)
            .await
            .unwrap();

        h.clock.advance(10_000);
        let view = h.service.open_case(page_row(), FormMode::Edit2, None, &mut session).await.unwrap();
        assert_eq!(view.state, LockState::Completed);
        assert_eq!(view.remaining_seconds, 0);
        assert_eq!(view.expiry, ExpiryOutcome::NotExpired);
        assert!(view.source.is_none());
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some(""));

        let err = h
            .service
            .submit_priority(page_row(), Priority::P3, None, &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Locked { state: LockState::Completed, .. }));
    }

    #[tokio::test]
    async fn expired_case_rejects_submissions() {
        let h = harness("60").await;
        let mut session = SessionState::new();
        h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        h.clock.advance(61);

        let err = h
            .service
            .submit_treatment(page_row(), &BTreeMap::new(), None, &mut session)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Locked);
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn missing_row_is_a_backend_error() {
        let h = harness("60").await;
        let mut session = SessionState::new();
        let err = h
            .service
            .open_case(PageRow::new(5), FormMode::Edit1, None, &mut session)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn issued_token_unlocks_signed_variant() {
        let signer = Arc::new(TokenSigner::new(b"ward"));
        let h = harness_with("120", Some(Arc::new(SignedTokenLock::new(signer)))).await;
        let mut session = SessionState::new();

        let err = h
            .service
            .open_case(page_row(), FormMode::Edit1, None, &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Unauthorized(TokenError::Missing)));

        let issued = h.service.issue_token(page_row(), false).await.unwrap();
        assert_eq!(issued.exp, T0 + 600);
        let view = h
            .service
            .open_case(page_row(), FormMode::Edit1, Some(&issued.token), &mut session)
            .await
            .unwrap();
        assert_eq!(view.state, LockState::Running);
        assert_eq!(view.remaining_seconds, 600);
        assert_eq!(h.store.write_count(), 0);

        h.clock.advance(601);
        let expired = h
            .service
            .open_case(page_row(), FormMode::Edit1, Some(&issued.token), &mut session)
            .await
            .unwrap();
        assert_eq!(expired.state, LockState::Expired);
        assert_eq!(expired.expiry, ExpiryOutcome::Incremented { counter: 1 });
    }

    #[tokio::test]
    async fn reissued_token_does_not_reopen_expired_case() {
        let signer = Arc::new(TokenSigner::new(b"ward"));
        let h = harness_with("120", Some(Arc::new(SignedTokenLock::new(signer)))).await;
        let mut session = SessionState::new();

        let first = h.service.issue_token(page_row(), false).await.unwrap();
        h.clock.advance(601);
        let expired = h
            .service
            .open_case(page_row(), FormMode::Edit1, Some(&first.token), &mut session)
            .await
            .unwrap();
        assert_eq!(expired.expiry, ExpiryOutcome::Incremented { counter: 1 });

        let second = h.service.issue_token(page_row(), false).await.unwrap();
        let view = h
            .service
            .open_case(page_row(), FormMode::Edit1, Some(&second.token), &mut session)
            .await
            .unwrap();
        assert_eq!(view.state, LockState::Expired);
        assert_eq!(view.remaining_seconds, 0);
        assert!(!view.editable);
        assert_eq!(view.mode, FormMode::View);
        assert_eq!(view.expiry, ExpiryOutcome::AlreadyProcessed);
        assert!(view.source.is_none());

        let err = h
            .service
            .submit_priority(page_row(), Priority::P1, Some(&second.token), &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Locked { state: LockState::Expired, .. }));
        assert_eq!(h.store.cell(sheet_row(), "V").await.as_deref(), Some(""));
        assert_eq!(h.store.cell(sheet_row(), "Z").await.as_deref(), Some("1"));

        let status = h.service.status(page_row()).await.unwrap();
        assert_eq!(status.state, LockState::Expired);
        assert_eq!(status.remaining_seconds, 0);
    }

    #[tokio::test]
    async fn fresh_remote_window_does_not_reopen_expired_case() {
        let timer = Arc::new(ScriptedTimer::default());
        *timer.get_reply.lock().unwrap() = Some(ScriptedTimer::snapshot(60, T0, T0 + 60));
        let h = harness_with("120", Some(Arc::new(TimerServiceLock::new(timer.clone())))).await;
        let mut session = SessionState::new();

        h.clock.advance(61);
        let expired = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(expired.expiry, ExpiryOutcome::Incremented { counter: 1 });

        let restarted = T0 + 61;
        *timer.get_reply.lock().unwrap() = Some(ScriptedTimer::snapshot(60, restarted, restarted + 60));
        let view = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(view.state, LockState::Expired);
        assert!(!view.editable);
        assert_eq!(*timer.calls.lock().unwrap(), vec!["get"]);
    }

    #[tokio::test]
    async fn recorded_token_is_written_to_token_column() {
        let h = harness("120").await;
        let issued = h.service.issue_token(page_row(), true).await.unwrap();
        assert!(issued.recorded);
        assert_eq!(h.store.cell(sheet_row(), "Y").await, Some(issued.token));
    }

    #[tokio::test]
    async fn timer_service_fallback_is_reported() {
        let timer = Arc::new(ScriptedTimer::default());
        let h = harness_with("120", Some(Arc::new(TimerServiceLock::new(timer.clone())))).await;
        let mut session = SessionState::new();

        let view = h.service.open_case(page_row(), FormMode::Edit1, None, &mut session).await.unwrap();
        assert_eq!(view.source, Some(LockVariant::EpochPair));
        assert!(view.fallback_reason.is_some());
        assert_eq!(view.remaining_seconds, 120);
        assert_eq!(h.events.names(), vec!["timer_service_fallback", "timer_started"]);

        h.service
            .submit_priority(page_row(), Priority::P1, None, &mut session)
            .await
            .unwrap();
        h.service.open_case(page_row(), FormMode::View, None, &mut session).await.unwrap();
        let stops = timer.calls.lock().unwrap().iter().filter(|c| **c == "stop").count();
        assert_eq!(stops, 1);
    }
}
