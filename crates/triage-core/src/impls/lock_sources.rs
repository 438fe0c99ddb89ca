//! LockSource の 3 実装
//!
//! - EpochPairLock: ストアの開始・期限列（未開始なら今から開始）
//! - SignedTokenLock: トークンの `exp` を期限とする（書き込みなし）
//! - TimerServiceLock: 外部タイマー、失敗時は EpochPairLock にフォールバック

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::errors::TriageError;
use crate::domain::evaluation::{TimerWindow, start_if_needed};
use crate::domain::ids::PageRow;
use crate::domain::token::TokenError;
use crate::impls::hmac_token::TokenSigner;
use crate::ports::{LockRequest, LockSource, LockVariant, Resolution, TimerService, TimerServiceError};

/// Start/deadline columns in the store are the lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochPairLock;

#[async_trait]
impl LockSource for EpochPairLock {
    fn variant(&self) -> LockVariant {
        LockVariant::EpochPair
    }

    async fn resolve(&self, request: &LockRequest<'_>) -> Result<Resolution, TriageError> {
        let current = request.case.window;
        let window = start_if_needed(current, request.now);
        Ok(Resolution {
            window,
            persist: window != current,
            source: LockVariant::EpochPair,
            fallback_reason: None,
        })
    }
}

/// The token's `exp` is the deadline.
///
/// The presented token wins; otherwise the one recorded in the token column
/// is used. An expired token still resolves, so the case evaluates to
/// Expired instead of being rejected outright.
pub struct SignedTokenLock {
    signer: Arc<TokenSigner>,
}

impl SignedTokenLock {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl LockSource for SignedTokenLock {
    fn variant(&self) -> LockVariant {
        LockVariant::SignedToken
    }

    async fn resolve(&self, request: &LockRequest<'_>) -> Result<Resolution, TriageError> {
        let token = request
            .token
            .or(request.case.token.as_deref())
            .ok_or(TokenError::Missing)?;
        let claims = self.signer.decode_for_row(token, request.page_row)?;

        let origin = request.case.window.origin_seconds;
        let window = TimerWindow::new(origin, (claims.exp - origin).max(0), claims.exp);
        Ok(Resolution::unchanged(window, LockVariant::SignedToken))
    }
}

/// External timer first, store second.
pub struct TimerServiceLock {
    service: Arc<dyn TimerService>,
    fallback: EpochPairLock,
}

impl TimerServiceLock {
    pub fn new(service: Arc<dyn TimerService>) -> Self {
        Self {
            service,
            fallback: EpochPairLock,
        }
    }

    async fn remote_window(
        &self,
        row: PageRow,
        origin_seconds: i64,
    ) -> Result<Option<TimerWindow>, TimerServiceError> {
        let mut snapshot = self.service.get(row).await?;
        if snapshot.timer_seconds > 0 && snapshot.end_epoch == 0 {
            debug!(row = row.get(), "asking timer service to start");
            snapshot = self.service.start(row).await?;
        }
        if snapshot.end_epoch <= 0 {
            return Ok(None);
        }
        let origin = if snapshot.timer_seconds > 0 {
            snapshot.timer_seconds
        } else {
            origin_seconds
        };
        Ok(Some(TimerWindow::new(origin, snapshot.t0_epoch, snapshot.end_epoch)))
    }
}

#[async_trait]
impl LockSource for TimerServiceLock {
    fn variant(&self) -> LockVariant {
        LockVariant::TimerService
    }

    async fn resolve(&self, request: &LockRequest<'_>) -> Result<Resolution, TriageError> {
        let reason = match self
            .remote_window(request.page_row, request.case.window.origin_seconds)
            .await
        {
            Ok(Some(window)) => return Ok(Resolution::unchanged(window, LockVariant::TimerService)),
            Ok(None) => "timer service reported no end epoch".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(row = request.page_row.get(), reason = %reason, "timer service unusable, using store");
        let mut resolution = self.fallback.resolve(request).await?;
        resolution.fallback_reason = Some(reason);
        Ok(resolution)
    }

    async fn on_completed(&self, row: PageRow) -> Result<(), TriageError> {
        self.service.stop(row).await?;
        Ok(())
    }
}
