use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::logging::{LogConfig, LogRotation};
use crate::time::parse_reference_time;

/// Poll interval used in debug mode when no override is given.
pub const DEBUG_POLL_INTERVAL_SECS: u64 = 60;

/// Poll interval used in production when no override is given.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

/// Timeout applied to every feed fetch and webhook POST.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Raw, unvalidated settings as they arrive from flags, environment or `.env`.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub webhook_url: String,
    pub webhook_secret: Option<String>,
    pub rss_url: String,
    pub debug: bool,
    pub reference_time: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
    pub log_file: Option<String>,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Feishu/Lark custom bot webhook URL
    pub webhook_url: String,

    /// Signing secret of the bot; `None` disables request signing
    pub webhook_secret: Option<String>,

    /// RSS or Atom feed to watch
    pub rss_url: String,

    /// Verbose logging and the short poll interval
    pub debug: bool,

    /// Initial watermark: the reference time converted from Beijing time to UTC
    pub start_watermark: DateTime<Utc>,

    /// Delay between poll cycles
    pub poll_interval: Duration,

    /// Timeout for each outbound HTTP request
    pub http_timeout: Duration,

    /// Directory that receives the log file (default: `logs`)
    pub log_dir: PathBuf,

    /// Log file name inside `log_dir` (default: `paper_bot.log`)
    pub log_file: String,
}

impl AppConfig {
    /// Validate raw settings. `now` seeds the watermark when no reference time is given.
    pub fn from_raw(raw: RawConfig, now: DateTime<Utc>) -> Result<Self, AppError> {
        let webhook_url = raw.webhook_url.trim().to_string();
        if webhook_url.is_empty() {
            return Err(AppError::Config("WEBHOOK_URL must not be empty".to_string()));
        }

        let rss_url = raw.rss_url.trim().to_string();
        if rss_url.is_empty() {
            return Err(AppError::Config("RSS_URL must not be empty".to_string()));
        }

        // An empty secret behaves like no secret at all.
        let webhook_secret = raw.webhook_secret.filter(|s| !s.is_empty());

        let start_watermark = match raw.reference_time.as_deref() {
            Some(input) if !input.trim().is_empty() => parse_reference_time(input)?,
            _ => now,
        };

        let poll_interval_secs = raw.poll_interval_secs.unwrap_or(if raw.debug {
            DEBUG_POLL_INTERVAL_SECS
        } else {
            DEFAULT_POLL_INTERVAL_SECS
        });
        if poll_interval_secs == 0 {
            return Err(AppError::Config(
                "POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        let http_timeout_secs = raw.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        if http_timeout_secs == 0 {
            return Err(AppError::Config(
                "HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            webhook_url,
            webhook_secret,
            rss_url,
            debug: raw.debug,
            start_watermark,
            poll_interval: Duration::from_secs(poll_interval_secs),
            http_timeout: Duration::from_secs(http_timeout_secs),
            log_dir: raw.log_dir.unwrap_or_else(|| PathBuf::from("logs")),
            log_file: raw.log_file.unwrap_or_else(|| "paper_bot.log".to_string()),
        })
    }

    /// Logging setup derived from this configuration.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: if self.debug {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            },
            directory: self.log_dir.clone(),
            file_name: self.log_file.clone(),
            rotation: LogRotation::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn raw() -> RawConfig {
        RawConfig {
            webhook_url: "https://open.feishu.cn/open-apis/bot/v2/hook/test".to_string(),
            rss_url: "https://example.com/feed.xml".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let config = AppConfig::from_raw(raw(), now).unwrap();
        assert_eq!(config.start_watermark, now);
        assert_eq!(config.poll_interval, Duration::from_secs(3600));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.log_file, "paper_bot.log");
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn test_debug_uses_short_interval() {
        let config = AppConfig::from_raw(
            RawConfig {
                debug: true,
                ..raw()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.log_config().level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_interval_override_wins() {
        let config = AppConfig::from_raw(
            RawConfig {
                debug: true,
                poll_interval_secs: Some(5),
                ..raw()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_reference_time_seeds_watermark() {
        let config = AppConfig::from_raw(
            RawConfig {
                reference_time: Some("2024-12-22 19:19:22".to_string()),
                ..raw()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(
            config.start_watermark,
            Utc.with_ymd_and_hms(2024, 12, 22, 11, 19, 22).unwrap()
        );
    }

    #[test]
    fn test_empty_secret_disables_signing() {
        let config = AppConfig::from_raw(
            RawConfig {
                webhook_secret: Some(String::new()),
                ..raw()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn test_rejects_missing_urls_and_zero_interval() {
        let err = AppConfig::from_raw(
            RawConfig {
                webhook_url: "  ".to_string(),
                ..raw()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL"));

        let err = AppConfig::from_raw(
            RawConfig {
                poll_interval_secs: Some(0),
                ..raw()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_SECS"));
    }

    #[test]
    fn test_bad_reference_time_is_an_error() {
        let err = AppConfig::from_raw(
            RawConfig {
                reference_time: Some("yesterday".to_string()),
                ..raw()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidReferenceTime { .. }));
    }
}
