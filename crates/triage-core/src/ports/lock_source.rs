//! LockSource port - 残り時間と編集可否の「窓」をどこから得るか
//!
//! ロックの方式は 3 種類あり、設定で 1 つを選びます。呼び出し側は方式ごとに
//! 分岐せず、この trait だけを使います。
//!
//! - **EpochPair**: ストアの開始・期限列（初回読み取り時に書き込む）
//! - **SignedToken**: 署名付きトークンの `exp` が期限（ステートレス）
//! - **TimerService**: 外部タイマーサービス（失敗時は EpochPair にフォールバック）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::case::CaseRecord;
use crate::domain::errors::TriageError;
use crate::domain::evaluation::TimerWindow;
use crate::domain::ids::PageRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockVariant {
    #[default]
    EpochPair,
    SignedToken,
    TimerService,
}

impl LockVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            LockVariant::EpochPair => "epoch_pair",
            LockVariant::SignedToken => "signed_token",
            LockVariant::TimerService => "timer_service",
        }
    }
}

impl fmt::Display for LockVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a lock source may look at for one page load.
#[derive(Debug, Clone, Copy)]
pub struct LockRequest<'a> {
    pub case: &'a CaseRecord,
    pub page_row: PageRow,
    pub token: Option<&'a str>,
    pub now: i64,
}

/// The window a lock source resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub window: TimerWindow,

    /// Start/deadline were newly decided and must be written to the store.
    pub persist: bool,

    /// Which variant actually produced the window (after any fallback).
    pub source: LockVariant,

    /// Why the configured variant was not used, if it fell back.
    pub fallback_reason: Option<String>,
}

impl Resolution {
    pub fn unchanged(window: TimerWindow, source: LockVariant) -> Self {
        Self {
            window,
            persist: false,
            source,
            fallback_reason: None,
        }
    }
}

/// LockSource は「残り時間と編集可否を解決する」能力
///
/// # 設計原則
/// - resolve は窓を返すだけ。ストアへの書き込みは app 層がまとめて行う
/// - 評価（RUNNING / EXPIRED など）は `domain::evaluate` が共通で担う
#[async_trait]
pub trait LockSource: Send + Sync {
    fn variant(&self) -> LockVariant;

    async fn resolve(&self, request: &LockRequest<'_>) -> Result<Resolution, TriageError>;

    /// Called after a terminal submission was persisted. Best effort.
    async fn on_completed(&self, _row: PageRow) -> Result<(), TriageError> {
        Ok(())
    }
}
