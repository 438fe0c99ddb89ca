//! CaseStore port - スプレッドシート（正本）への読み書き
//!
//! CaseStore は以下を管理します：
//! - ヘッダー行（1 行目）
//! - ケース行の読み取り（ヘッダー幅まで空文字で埋める）
//! - セルの書き込み（1 回の呼び出しはアトミック）
//!
//! # 実装
//! - `impls::InMemoryCaseStore`（テスト・開発用）
//! - `impls::CsvCaseStore`（CSV ファイルをシートとして扱う）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ids::SheetRow;
use crate::domain::layout::Column;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    RowNotFound(SheetRow),

    #[error("cannot write to the header row")]
    HeaderWrite,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store format error: {0}")]
    Format(String),
}

/// A batch of cell writes for one row.
pub type CellWrites = Vec<(Column, String)>;

/// CaseStore は状態の正本（source of truth）
///
/// # 設計原則
/// - `write_cells` は全セル成功か全セル失敗のどちらか（部分書き込みなし）
/// - 開始時刻と期限、カウンターと処理済みフラグは必ず同じバッチで書く
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Row 1 of the sheet.
    async fn headers(&self) -> Result<Vec<String>, StoreError>;

    /// Values of `row`, padded with "" to at least the header width.
    async fn read_row(&self, row: SheetRow) -> Result<Vec<String>, StoreError>;

    /// Apply all writes to `row` atomically.
    async fn write_cells(&self, row: SheetRow, writes: &[(Column, String)])
    -> Result<(), StoreError>;

    /// Display name for diagnostics (worksheet / file).
    fn name(&self) -> &str;
}
