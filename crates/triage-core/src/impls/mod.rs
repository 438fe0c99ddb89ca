//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryCaseStore** / **CsvCaseStore**: ケースの正本
//! - **HttpTimerService**: 外部タイマーサービス（reqwest）
//! - **TokenSigner**: HMAC-SHA256 のケーストークン
//! - **EpochPairLock** / **SignedTokenLock** / **TimerServiceLock**: ロック方式
//! - **TracingEventSink** / **RecordingEventSink**: イベントの送信先

pub mod csv_store;
pub mod hmac_token;
pub mod http_timer;
pub mod inmem_store;
pub mod lock_sources;
pub mod tracing_sink;

// 主要な型を再エクスポート
pub use self::csv_store::CsvCaseStore;
pub use self::hmac_token::TokenSigner;
pub use self::http_timer::HttpTimerService;
pub use self::inmem_store::InMemoryCaseStore;
pub use self::lock_sources::{EpochPairLock, SignedTokenLock, TimerServiceLock};
pub use self::tracing_sink::{RecordingEventSink, TracingEventSink};
