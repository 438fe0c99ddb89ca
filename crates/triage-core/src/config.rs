//! Config - YAML 設定の読み込みと検証
//!
//! 起動時に一度だけ読み、欠けている必須項目はここで Configuration エラーにする
//! （リクエスト処理の途中で設定不備に気付くことはない）。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::errors::TriageError;
use crate::domain::layout::ColumnLayout;
use crate::impls::http_timer::DEFAULT_TIMEOUT;
use crate::ports::LockVariant;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for TriageError {
    fn from(e: ConfigError) -> Self {
        TriageError::Configuration(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Csv,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    pub path: Option<PathBuf>,
    pub worksheet: Option<String>,
}

impl StoreConfig {
    pub fn worksheet_name(&self) -> &str {
        self.worksheet.as_deref().unwrap_or("Secondary")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub variant: LockVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerServiceConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TimerServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
}

fn default_ttl_secs() -> i64 {
    600
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub layout: ColumnLayout,
    pub lock: LockConfig,
    pub timer_service: Option<TimerServiceConfig>,
    pub token: Option<TokenConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Required pieces for the chosen store and lock variant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.store.kind == StoreKind::Csv && self.store.path.is_none() {
            return Err(ConfigError::Invalid("store.path is required for a csv store".into()));
        }

        match self.lock.variant {
            LockVariant::EpochPair => {}
            LockVariant::SignedToken => {
                if self.token.as_ref().is_none_or(|t| t.secret.is_empty()) {
                    return Err(ConfigError::Invalid(
                        "token.secret is required for the signed_token lock".into(),
                    ));
                }
            }
            LockVariant::TimerService => match &self.timer_service {
                Some(ts) if !ts.url.trim().is_empty() && ts.timeout_secs > 0 => {}
                Some(ts) if ts.timeout_secs == 0 => {
                    return Err(ConfigError::Invalid(
                        "timer_service.timeout_secs must be positive".into(),
                    ));
                }
                _ => {
                    return Err(ConfigError::Invalid(
                        "timer_service.url is required for the timer_service lock".into(),
                    ));
                }
            },
        }

        if let Some(token) = &self.token
            && token.ttl_secs <= 0
        {
            return Err(ConfigError::Invalid("token.ttl_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::layout::Column;

    #[test]
    fn full_file_parses() {
        let yaml = r#"
store:
  kind: csv
  path: cases.csv
  worksheet: Ward7
layout:
  origin: AD
lock:
  variant: timer_service
timer_service:
  url: https://timer.example/exec
  token: shh
token:
  secret: k
  ttl_secs: 300
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.store.worksheet_name(), "Ward7");
        assert_eq!(config.layout.origin, Column::parse("AD").unwrap());
        assert_eq!(config.layout.start_epoch, Column::parse("W").unwrap());
        assert_eq!(config.lock.variant, LockVariant::TimerService);
        let ts = config.timer_service.unwrap();
        assert_eq!(ts.timeout(), Duration::from_secs(20));
        assert_eq!(ts.token.as_deref(), Some("shh"));
        assert_eq!(config.token.unwrap().ttl_secs, 300);
    }

    #[test]
    fn memory_store_needs_nothing_else() {
        let config = Config::from_yaml_str("store:\n  kind: memory\n").unwrap();
        assert_eq!(config.lock.variant, LockVariant::EpochPair);
        assert_eq!(config.layout, ColumnLayout::default());
        assert_eq!(config.store.worksheet_name(), "Secondary");
    }

    #[test]
    fn missing_required_pieces_are_rejected() {
        for yaml in [
            "store:\n  kind: csv\n",
            "store:\n  kind: memory\nlock:\n  variant: signed_token\n",
            "store:\n  kind: memory\nlock:\n  variant: timer_service\n",
            "store:\n  kind: memory\nlock:\n  variant: timer_service\ntimer_service:\n  url: http://x\n  timeout_secs: 0\n",
            "store:\n  kind: memory\nlayout:\n  origin: W\n",
            "store:\n  kind: memory\nlayout:\n  priority: M\n",
        ] {
            let err = Config::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml}: {err}");
            assert_eq!(TriageError::from(err).kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn bad_yaml_and_columns_are_parse_errors() {
        assert!(matches!(
            Config::from_yaml_str("store: [").unwrap_err(),
            ConfigError::Parse(_)
        ));
        assert!(matches!(
            Config::from_yaml_str("layout:\n  origin: \"1A\"\n").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn out_of_range_column_is_a_configuration_error() {
        for origin in ["ZZZZZZ", "ZZZZZZZZZZZZZZZZ"] {
            let yaml = format!("store:\n  kind: memory\nlayout:\n  origin: {origin}\n");
            let err = Config::from_yaml_str(&yaml).unwrap_err();
            assert!(err.to_string().contains("XFD"), "{err}");
            assert_eq!(TriageError::from(err).kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/triage.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.yaml");
        std::fs::write(&path, "store:\n  kind: memory\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().store.kind, StoreKind::Memory);
    }
}
