//! EventSink port - イベント記録の抽象化
//!
//! # 実装
//! - TracingEventSink: tracing にログとして出す（デフォルト）
//! - RecordingEventSink: テスト用にメモリへ溜める

use crate::domain::events::DomainEvent;

/// EventSink はドメインイベントを記録
///
/// 記録の失敗でケースの処理を止めないよう、戻り値は持たない。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}
