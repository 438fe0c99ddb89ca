//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 設定ファイルからのワイヤリング（`from_config`）

use std::sync::Arc;

use crate::app::expiry::ExpiryGuard;
use crate::app::service::{TokenIssuer, TriageService};
use crate::config::{Config, StoreKind};
use crate::domain::errors::TriageError;
use crate::domain::layout::ColumnLayout;
use crate::impls::{
    CsvCaseStore, EpochPairLock, HttpTimerService, InMemoryCaseStore, SignedTokenLock,
    TimerServiceLock, TokenSigner, TracingEventSink,
};
use crate::ports::{CaseStore, Clock, EventSink, LockSource, LockVariant, SystemClock};

/// AppBuilder は TriageService を構築
///
/// # 使用例
/// ```ignore
/// let service = AppBuilder::new()
///     .store(Arc::new(CsvCaseStore::new("cases.csv", "Secondary")))
///     .lock_source(Arc::new(EpochPairLock))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store と lock_source は必須（既定値なし）
/// - clock は SystemClock、events は TracingEventSink が既定
/// - build() 時にレイアウトと、署名トークン方式の鍵の有無をチェック
pub struct AppBuilder {
    store: Option<Arc<dyn CaseStore>>,
    lock: Option<Arc<dyn LockSource>>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    layout: ColumnLayout,
    issuer: Option<TokenIssuer>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No case store configured.")]
    MissingStore,

    #[error("No lock source configured.")]
    MissingLockSource,

    #[error("The signed_token lock needs a token issuer (secret).")]
    MissingTokenIssuer,

    #[error("Invalid column layout: {0}")]
    InvalidLayout(String),
}

impl From<BuildError> for TriageError {
    fn from(e: BuildError) -> Self {
        TriageError::Configuration(e.to_string())
    }
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            lock: None,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
            layout: ColumnLayout::default(),
            issuer: None,
        }
    }

    /// Wire everything the configuration names.
    pub fn from_config(config: &Config) -> Result<Self, TriageError> {
        config.validate()?;

        let store: Arc<dyn CaseStore> = match config.store.kind {
            StoreKind::Csv => {
                let path = config
                    .store
                    .path
                    .clone()
                    .ok_or_else(|| TriageError::config("store.path is required for a csv store"))?;
                Arc::new(CsvCaseStore::new(path, config.store.worksheet_name()))
            }
            StoreKind::Memory => Arc::new(InMemoryCaseStore::new(Vec::new())),
        };

        let mut builder = Self::new().store(store).layout(config.layout.clone());

        if let Some(token) = &config.token {
            let signer = Arc::new(TokenSigner::new(token.secret.as_bytes()));
            builder = builder.token_issuer(signer, token.ttl_secs);
        }

        let lock: Arc<dyn LockSource> = match config.lock.variant {
            LockVariant::EpochPair => Arc::new(EpochPairLock),
            LockVariant::SignedToken => {
                let issuer = builder.issuer.as_ref().ok_or(BuildError::MissingTokenIssuer)?;
                Arc::new(SignedTokenLock::new(Arc::clone(&issuer.signer)))
            }
            LockVariant::TimerService => {
                let ts = config.timer_service.as_ref().ok_or_else(|| {
                    TriageError::config("timer_service section is required for the timer_service lock")
                })?;
                let service = HttpTimerService::new(ts.url.clone(), ts.token.clone(), ts.timeout())
                    .map_err(|e| TriageError::config(format!("timer service client: {e}")))?;
                Arc::new(TimerServiceLock::new(Arc::new(service)))
            }
        };
        Ok(builder.lock_source(lock))
    }

    pub fn store(mut self, store: Arc<dyn CaseStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn lock_source(mut self, lock: Arc<dyn LockSource>) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn token_issuer(mut self, signer: Arc<TokenSigner>, ttl_secs: i64) -> Self {
        self.issuer = Some(TokenIssuer { signer, ttl_secs });
        self
    }

    /// AppBuilder を検証して TriageService を生成
    ///
    /// # 検証
    /// - store / lock_source が設定されているか
    /// - レイアウトの列が重複していないか
    /// - signed_token 方式なら token issuer があるか
    pub fn build(self) -> Result<TriageService, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let lock = self.lock.ok_or(BuildError::MissingLockSource)?;
        self.layout
            .validate()
            .map_err(|e| BuildError::InvalidLayout(e.to_string()))?;
        if lock.variant() == LockVariant::SignedToken && self.issuer.is_none() {
            return Err(BuildError::MissingTokenIssuer);
        }

        let expiry = ExpiryGuard::new(Arc::clone(&store), Arc::clone(&self.events), self.layout.clone());
        Ok(TriageService {
            store,
            lock,
            clock: self.clock,
            events: self.events,
            layout: self.layout,
            issuer: self.issuer,
            expiry,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::Column;

    fn store() -> Arc<dyn CaseStore> {
        Arc::new(InMemoryCaseStore::new(Vec::new()))
    }

    #[test]
    fn test_build_success() {
        let service = AppBuilder::new()
            .store(store())
            .lock_source(Arc::new(EpochPairLock))
            .build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_build_missing_parts() {
        let missing_store = AppBuilder::new().lock_source(Arc::new(EpochPairLock)).build();
        assert!(matches!(missing_store, Err(BuildError::MissingStore)));

        let missing_lock = AppBuilder::new().store(store()).build();
        assert!(matches!(missing_lock, Err(BuildError::MissingLockSource)));
    }

    #[test]
    fn test_build_signed_token_needs_issuer() {
        let signer = Arc::new(TokenSigner::new(b"k"));
        let result = AppBuilder::new()
            .store(store())
            .lock_source(Arc::new(SignedTokenLock::new(signer)))
            .build();
        assert!(matches!(result, Err(BuildError::MissingTokenIssuer)));
    }

    #[test]
    fn test_build_rejects_overlapping_layout() {
        let layout = ColumnLayout {
            completed: Column::parse("W").unwrap(),
            ..ColumnLayout::default()
        };
        let result = AppBuilder::new()
            .store(store())
            .lock_source(Arc::new(EpochPairLock))
            .layout(layout)
            .build();
        assert!(matches!(result, Err(BuildError::InvalidLayout(_))));
    }

    #[test]
    fn test_from_config_wires_variants() {
        for (yaml, variant) in [
            ("store:\n  kind: memory\n", LockVariant::EpochPair),
            (
                "store:\n  kind: memory\nlock:\n  variant: signed_token\ntoken:\n  secret: k\n",
                LockVariant::SignedToken,
            ),
            (
                "store:\n  kind: memory\nlock:\n  variant: timer_service\ntimer_service:\n  url: http://127.0.0.1:9/exec\n",
                LockVariant::TimerService,
            ),
        ] {
            let config = Config::from_yaml_str(yaml).unwrap();
            let service = AppBuilder::from_config(&config).unwrap().build().unwrap();
            assert_eq!(service.lock_variant(), variant);
        }
    }

    #[test]
    fn test_from_config_csv_store() {
        let config = Config::from_yaml_str(
            "store:\n  kind: csv\n  path: /tmp/cases.csv\n  worksheet: Ward7\n",
        )
        .unwrap();
        let service = AppBuilder::from_config(&config).unwrap().build().unwrap();
        assert_eq!(service.store.name(), "Ward7");
    }
}
