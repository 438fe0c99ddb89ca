//! Status - タイマー診断
//!
//! ストアに記録された窓だけを読む（開始の書き込みも外部呼び出しもしない）。
//! 期限切れが記録済みなら、窓がストアに無い方式（signed_token）でも EXPIRED と表示する。
//! 「タイマーが 0 のまま」という典型的な設定ミスにはヒントを付ける。

use serde::Serialize;

use crate::domain::case::CaseRecord;
use crate::domain::duration::fmt_hms;
use crate::domain::evaluation::evaluate_recorded;
use crate::domain::ids::{PageRow, SheetRow};
use crate::domain::layout::ColumnLayout;
use crate::domain::state::LockState;
use crate::ports::LockVariant;

/// Diagnostics for one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub row: PageRow,
    pub sheet_row: SheetRow,
    pub store: String,
    pub lock_variant: LockVariant,
    pub origin_column: String,
    pub origin_raw: String,
    pub origin_seconds: i64,
    pub start_epoch: i64,
    pub deadline_epoch: i64,
    pub remaining_seconds: i64,
    pub remaining_hms: String,
    pub state: LockState,
    pub expired_counter: u32,
    pub expiry_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StatusView {
    pub fn from_case(
        row: PageRow,
        case: &CaseRecord,
        layout: &ColumnLayout,
        store: &str,
        lock_variant: LockVariant,
        now: i64,
    ) -> Self {
        let window = case.window;
        let eval = evaluate_recorded(now, window, case.completed, case.expiry_processed);
        Self {
            row,
            sheet_row: case.row,
            store: store.to_string(),
            lock_variant,
            origin_column: layout.origin.to_string(),
            origin_raw: case.origin_raw.clone(),
            origin_seconds: window.origin_seconds,
            start_epoch: window.start_epoch,
            deadline_epoch: window.deadline_epoch,
            remaining_seconds: eval.remaining_seconds,
            remaining_hms: fmt_hms(eval.remaining_seconds),
            state: eval.state,
            expired_counter: case.expired_counter,
            expiry_processed: case.expiry_processed,
            hint: hint(case, layout),
        }
    }
}

fn hint(case: &CaseRecord, layout: &ColumnLayout) -> Option<String> {
    let window = case.window;
    if window.origin_seconds != 0 || window.deadline_epoch != 0 {
        return None;
    }
    Some(format!(
        "timer is 0: column {} holds {:?}; expected seconds or a time such as 120, 02:00 or 00:01:30",
        layout.origin, case.origin_raw
    ))
}
