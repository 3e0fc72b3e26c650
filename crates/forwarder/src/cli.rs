use std::path::PathBuf;

use clap::Parser;

use paperbot_common::config::RawConfig;
use paperbot_common::logging::LogConfig;

/// Watch an RSS/Atom feed and forward new entries to a Feishu bot.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feishu bot webhook URL
    #[arg(short = 'w', long, env = "WEBHOOK_URL")]
    pub webhook_url: String,

    /// Feishu bot signing secret
    #[arg(short = 's', long, env = "WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,

    /// Feed URL to watch
    #[arg(
        short = 'r',
        long,
        env = "RSS_URL",
        required_unless_present = "test_webhook"
    )]
    pub rss_url: Option<String>,

    /// Debug logging and a one-minute poll interval
    #[arg(short = 'd', long, env = "DEBUG")]
    pub debug: bool,

    /// Only entries published after this Beijing time are sent (YYYY-MM-DD HH:MM:SS).
    /// Defaults to the start time.
    #[arg(short = 't', long, env = "REFERENCE_TIME")]
    pub reference_time: Option<String>,

    /// Seconds between polls (default: 60 in debug mode, 3600 otherwise)
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    /// Directory for the log file
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log file name
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,

    /// Send one text, one post and one card message to the webhook, then exit
    #[arg(long)]
    pub test_webhook: bool,
}

impl Cli {
    pub fn to_raw_config(&self) -> RawConfig {
        RawConfig {
            webhook_url: self.webhook_url.clone(),
            webhook_secret: self.webhook_secret.clone(),
            rss_url: self.rss_url.clone().unwrap_or_default(),
            debug: self.debug,
            reference_time: self.reference_time.clone(),
            poll_interval_secs: self.poll_interval_secs,
            http_timeout_secs: self.http_timeout_secs,
            log_dir: self.log_dir.clone(),
            log_file: self.log_file.clone(),
        }
    }

    /// Logging setup for `--test-webhook`, which runs without a validated feed config.
    pub fn log_config(&self) -> LogConfig {
        let defaults = LogConfig::default();
        LogConfig {
            level: if self.debug {
                tracing::Level::DEBUG
            } else {
                defaults.level
            },
            directory: self.log_dir.clone().unwrap_or(defaults.directory),
            file_name: self.log_file.clone().unwrap_or(defaults.file_name),
            rotation: defaults.rotation,
        }
    }
}
