//! Errors - エラー型と分類
//!
//! 運用上の分類（ErrorKind）と、各アダプターのエラーを束ねる TriageError。
//! 入力値（期間・タイムスタンプ）のパース失敗はここには現れません:
//! それらは 0（未開始）に正規化されます。

use thiserror::Error;

use super::ids::SheetRow;
use super::state::LockState;
use super::token::TokenError;
use crate::ports::case_store::StoreError;
use crate::ports::timer_service::TimerServiceError;

/// ErrorKind は実行エラーの分類
///
/// - Configuration: 設定不備（致命的、起動を止める）
/// - Backend: ストア / ネットワーク障害（そのリクエストは中断）
/// - Input: 利用者入力の不備（優先度の値など）
/// - Locked: 期限切れ・完了済みのケースへの書き込み
/// - Unauthorized: トークン検証の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Backend,
    Input,
    Locked,
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("timer service error: {0}")]
    TimerService(#[from] TimerServiceError),

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] TokenError),

    #[error("{row} is locked (state={state})")]
    Locked { row: SheetRow, state: LockState },

    #[error("invalid input: {0}")]
    Input(String),
}

impl TriageError {
    pub fn config(message: impl Into<String>) -> Self {
        TriageError::Configuration(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        TriageError::Input(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TriageError::Configuration(_) => ErrorKind::Configuration,
            TriageError::Store(_) | TriageError::TimerService(_) => ErrorKind::Backend,
            TriageError::Unauthorized(_) => ErrorKind::Unauthorized,
            TriageError::Locked { .. } => ErrorKind::Locked,
            TriageError::Input(_) => ErrorKind::Input,
        }
    }
}
