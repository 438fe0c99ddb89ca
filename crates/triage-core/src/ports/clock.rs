//! Clock port - 時刻の抽象化
//!
//! - SystemClock（本番用）
//! - FixedClock（テスト用、手動で進められる）

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock は現在時刻を提供
///
/// # テスト容易性
/// - trait により時刻を差し替え可能
/// - テストでは FixedClock を使用し、期限の前後を決定的に再現する
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current Unix time in whole seconds.
    fn epoch_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to (second precision).
#[derive(Debug)]
pub struct FixedClock {
    epoch: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self::at_epoch(at.timestamp())
    }

    pub fn at_epoch(secs: i64) -> Self {
        Self {
            epoch: AtomicI64::new(secs),
        }
    }

    pub fn set_epoch(&self, secs: i64) {
        self.epoch.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.epoch.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.epoch.load(Ordering::SeqCst), 0)
            .single()
            .unwrap_or_default()
    }

    fn epoch_seconds(&self) -> i64 {
        self.epoch.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_on_demand() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);

        clock.advance(121);
        assert_eq!(clock.epoch_seconds(), at.timestamp() + 121);
        assert_eq!(clock.now().timestamp(), at.timestamp() + 121);

        clock.set_epoch(5);
        assert_eq!(clock.epoch_seconds(), 5);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.epoch_seconds() > 1_577_836_800);
    }
}
