//! App - アプリケーション層
//!
//! ports を組み合わせて、ページ読み込みと送信の流れを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 構築とワイヤリング（設定ファイルからも可）
//! - **TriageService**: open_case / submit_treatment / submit_priority / issue_token / status
//! - **ExpiryGuard**: 期限切れカウンターを一度だけ進める
//! - **StatusView**: タイマー診断

pub mod builder;
pub mod expiry;
pub mod service;
pub mod session;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{AppBuilder, BuildError};
pub use self::expiry::{ExpiryGuard, ExpiryOutcome};
pub use self::service::{CaseView, IssuedToken, TokenIssuer, TriageService};
pub use self::session::SessionState;
pub use self::status::StatusView;
