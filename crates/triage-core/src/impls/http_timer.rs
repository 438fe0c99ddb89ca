//! HttpTimerService - 外部タイマーサービスの HTTP クライアント
//!
//! - `GET  {url}?action=get&row=N[&token=T]`
//! - `POST {url}` form `action=start_timer|stop_timer&row=N[&token=T]`
//!
//! 応答は JSON `{status, timer_seconds, t0_epoch, end_epoch}`。
//! `status != "ok"` は失敗として扱う。

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ids::PageRow;
use crate::ports::{TimerService, TimerServiceError, TimerSnapshot};

/// Upper bound for one request to the service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

pub struct HttpTimerService {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpTimerService {
    /// `url` is the service endpoint; a trailing slash is dropped.
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TimerServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn params(&self, action: &'static str, row: PageRow) -> Vec<(&'static str, String)> {
        let mut params = vec![("action", action.to_string()), ("row", row.get().to_string())];
        if let Some(token) = &self.token {
            params.push(("token", token.clone()));
        }
        params
    }

    async fn post(&self, action: &'static str, row: PageRow) -> Result<TimerSnapshot, TimerServiceError> {
        info!(url = %self.url, action, row = row.get(), "posting to timer service");
        let resp = self
            .client
            .post(&self.url)
            .form(&self.params(action, row))
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode(resp: reqwest::Response) -> Result<TimerSnapshot, TimerServiceError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TimerServiceError::Server {
            status: status.as_u16(),
            body,
        });
    }
    let body = resp.text().await?;
    let snapshot: TimerSnapshot = serde_json::from_str(&body)?;
    if !snapshot.is_ok() {
        return Err(TimerServiceError::NotOk(snapshot.status));
    }
    Ok(snapshot)
}

#[async_trait]
impl TimerService for HttpTimerService {
    async fn get(&self, row: PageRow) -> Result<TimerSnapshot, TimerServiceError> {
        info!(url = %self.url, row = row.get(), "reading timer");
        let resp = self
            .client
            .get(&self.url)
            .query(&self.params("get", row))
            .send()
            .await?;
        let snapshot = decode(resp).await?;
        info!(
            row = row.get(),
            timer_seconds = snapshot.timer_seconds,
            end_epoch = snapshot.end_epoch,
            "timer read"
        );
        Ok(snapshot)
    }

    async fn start(&self, row: PageRow) -> Result<TimerSnapshot, TimerServiceError> {
        self.post("start_timer", row).await
    }

    async fn stop(&self, row: PageRow) -> Result<(), TimerServiceError> {
        self.post("stop_timer", row).await.map(|_| ())
    }
}
