//! triage-core
//!
//! Deadline and lock evaluation for a spreadsheet-backed triage form.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（rows, layout, duration, evaluation, expiry, form, token, errors, events）
//! - **ports**: 抽象化レイヤー（CaseStore, LockSource, TimerService, Clock, EventSink）
//! - **impls**: 実装（InMemory / CSV ストア、HTTP タイマー、HMAC トークン、ロック方式）
//! - **app**: アプリケーションロジック（builder, service, expiry, status）
//! - **config**: YAML 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{AppBuilder, CaseView, SessionState, TriageService};
pub use config::Config;
pub use domain::{ErrorKind, TriageError};
