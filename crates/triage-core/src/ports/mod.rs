//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（スプレッドシート、外部タイマー、時計）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - スプレッドシート（CaseStore）が source of truth（正本）
//! - 外部タイマーは任意で、信頼できない協調先として扱う
//! - 時刻は必ず Clock から得る（テストで固定するため）

pub mod case_store;
pub mod clock;
pub mod event_sink;
pub mod lock_source;
pub mod timer_service;

// 主要な trait を再エクスポート
pub use self::case_store::{CaseStore, CellWrites, StoreError};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::lock_source::{LockRequest, LockSource, LockVariant, Resolution};
pub use self::timer_service::{TimerService, TimerServiceError, TimerSnapshot};
