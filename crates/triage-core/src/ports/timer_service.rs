//! TimerService port - 外部タイマーサービス（任意）
//!
//! 外部サービスは信頼できない協調先として扱います。
//! 失敗した場合、呼び出し側はストアの開始・期限にフォールバックします。

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::ids::PageRow;

#[derive(Debug, Error)]
pub enum TimerServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service replied status={0:?}")]
    NotOk(String),
}

/// Timer state as the service reports it.
///
/// Numbers may arrive as JSON numbers, numeric strings, null or be absent;
/// all of those decode leniently (absent/garbage = 0).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timer_seconds: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub t0_epoch: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub end_epoch: i64,
}

impl TimerSnapshot {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
            .unwrap_or(0),
        _ => 0,
    })
}

/// TimerService は外部のカウントダウン正本
///
/// - `get`: 現在のタイマー状態
/// - `start`: 未開始なら開始して状態を返す
/// - `stop`: 完了時の停止通知
#[async_trait]
pub trait TimerService: Send + Sync {
    async fn get(&self, row: PageRow) -> Result<TimerSnapshot, TimerServiceError>;

    async fn start(&self, row: PageRow) -> Result<TimerSnapshot, TimerServiceError>;

    async fn stop(&self, row: PageRow) -> Result<(), TimerServiceError>;
}
