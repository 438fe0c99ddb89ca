//! InMemoryCaseStore - 開発・テスト用のシート
//!
//! # 学習ポイント
//! - tokio::sync::Mutex で await を跨がない排他制御
//! - 書き込み失敗の注入（部分障害の再現）

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ids::SheetRow;
use crate::domain::layout::Column;
use crate::ports::{CaseStore, StoreError};

/// InMemoryCaseStore は開発用のシート
///
/// # 実装詳細
/// - `grid[0]` がヘッダー行（シートの 1 行目）
/// - 書き込みはロック内で全セルを検証してから反映する（all or nothing）
pub struct InMemoryCaseStore {
    grid: Mutex<Vec<Vec<String>>>,
    /// Number of upcoming `write_cells` calls that fail.
    failing_writes: AtomicU32,
    /// Successful `write_cells` calls so far.
    write_count: AtomicUsize,
}

impl InMemoryCaseStore {
    pub fn new(headers: Vec<String>) -> Self {
        Self::with_grid(vec![headers])
    }

    /// Build from string slices; the first row is the header row.
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        let grid: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        if grid.is_empty() {
            Self::new(Vec::new())
        } else {
            Self::with_grid(grid)
        }
    }

    fn with_grid(grid: Vec<Vec<String>>) -> Self {
        Self {
            grid: Mutex::new(grid),
            failing_writes: AtomicU32::new(0),
            write_count: AtomicUsize::new(0),
        }
    }

    /// Append a case row; returns its sheet row.
    pub async fn push_row(&self, values: Vec<String>) -> SheetRow {
        let mut grid = self.grid.lock().await;
        grid.push(values);
        SheetRow::new(grid.len() as u32)
    }

    /// Make the next `n` writes fail with `StoreError::Unavailable`.
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub async fn cell(&self, row: SheetRow, column: &str) -> Option<String> {
        let offset = Column::parse(column).ok()?.offset();
        let grid = self.grid.lock().await;
        let values = grid.get(row.get() as usize - 1)?;
        Some(values.get(offset).cloned().unwrap_or_default())
    }

    fn take_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn headers(&self) -> Result<Vec<String>, StoreError> {
        let grid = self.grid.lock().await;
        Ok(grid.first().cloned().unwrap_or_default())
    }

    async fn read_row(&self, row: SheetRow) -> Result<Vec<String>, StoreError> {
        let grid = self.grid.lock().await;
        let width = grid.first().map(Vec::len).unwrap_or(0);
        let mut values = grid
            .get(row.get() as usize - 1)
            .cloned()
            .ok_or(StoreError::RowNotFound(row))?;
        if values.len() < width {
            values.resize(width, String::new());
        }
        Ok(values)
    }

    async fn write_cells(
        &self,
        row: SheetRow,
        writes: &[(Column, String)],
    ) -> Result<(), StoreError> {
        if row == SheetRow::HEADER {
            return Err(StoreError::HeaderWrite);
        }
        if self.take_failure() {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        let mut grid = self.grid.lock().await;
        let values = grid
            .get_mut(row.get() as usize - 1)
            .ok_or(StoreError::RowNotFound(row))?;
        for (column, value) in writes {
            let offset = column.offset();
            if values.len() <= offset {
                values.resize(offset + 1, String::new());
            }
            values[offset] = value.clone();
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
