//! CsvCaseStore - CSV ファイルをシートとして扱うストア
//!
//! 1 行目がヘッダー、以降がケース行。書き込みは一時ファイルに全体を書いてから
//! rename するので、1 回の `write_cells` はディスク上でアトミックに見える。
//!
//! # 学習ポイント
//! - 同期ファイル I/O は spawn_blocking で async context から逃がす
//! - 書き込み同士は Mutex で直列化（read-modify-write の競合を防ぐ）

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::ids::SheetRow;
use crate::domain::layout::Column;
use crate::ports::{CaseStore, StoreError};

pub struct CsvCaseStore {
    path: Arc<PathBuf>,
    name: String,
    write_lock: Mutex<()>,
}

impl CsvCaseStore {
    /// `name` is the worksheet name shown in diagnostics.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: Arc::new(path.into()),
            name: name.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || read_grid(&path))
            .await
            .map_err(|e| StoreError::Unavailable(format!("read task failed: {e}")))?
    }
}

fn read_grid(path: &Path) -> Result<Vec<Vec<String>>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;
    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

fn write_grid(path: &Path, grid: &[Vec<String>]) -> Result<(), StoreError> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp)
            .map_err(csv_error)?;
        for row in grid {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn csv_error(e: csv::Error) -> StoreError {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(io) => StoreError::Io(io),
            other => StoreError::Format(format!("{other:?}")),
        }
    } else {
        StoreError::Format(e.to_string())
    }
}

#[async_trait]
impl CaseStore for CsvCaseStore {
    async fn headers(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load().await?.into_iter().next().unwrap_or_default())
    }

    async fn read_row(&self, row: SheetRow) -> Result<Vec<String>, StoreError> {
        let grid = self.load().await?;
        let width = grid.first().map(Vec::len).unwrap_or(0);
        let mut values = grid
            .into_iter()
            .nth(row.get() as usize - 1)
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
        let _guard = self.write_lock.lock().await;

        let path = Arc::clone(&self.path);
        let writes = writes.to_vec();
        let cells = writes.len();
        tokio::task::spawn_blocking(move || {
            let mut grid = read_grid(&path)?;
            let values = grid
                .get_mut(row.get() as usize - 1)
                .ok_or(StoreError::RowNotFound(row))?;
            for (column, value) in writes {
                let offset = column.offset();
                if values.len() <= offset {
                    values.resize(offset + 1, String::new());
                }
                values[offset] = value;
            }
            write_grid(&path, &grid)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("write task failed: {e}")))??;

        debug!(row = %row, cells, path = %self.path.display(), "csv cells written");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
