//! Process-wide log setup: human-readable stdout plus a JSON-lines file.
//!
//! `init` is called exactly once from `main` with an explicit [`LogConfig`];
//! library code only emits `tracing` events and never installs a subscriber.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Crates whose events are shown at the configured level.
const LOG_TARGETS: &[&str] = &[
    "paperbot",
    "paperbot_common",
    "paperbot_forwarder",
    "paperbot_notifier",
];

/// How often the log file is rolled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogRotation {
    Daily,
    /// Append to a single file forever.
    #[default]
    Never,
}

impl LogRotation {
    fn to_tracing_rotation(self) -> Rotation {
        match self {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging configuration: level plus the file destination. Stdout is always on.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub directory: PathBuf,
    pub file_name: String,
    pub rotation: LogRotation,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            directory: PathBuf::from("logs"),
            file_name: "paper_bot.log".to_string(),
            rotation: LogRotation::Never,
        }
    }
}

impl LogConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    pub fn default_directives(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Full path of the log file (for the first file when rotating).
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file output gets flushed.
pub fn init(config: &LogConfig) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let file_appender = RollingFileAppender::new(
        config.rotation.to_tracing_rotation(),
        &config.directory,
        &config.file_name,
    );
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
        .with(file_layer(file_writer))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(guard)
}

/// One JSON object per line.
fn file_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer().json().with_target(true).with_writer(writer)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_file_layer_writes_json_lines() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(file_layer(captured.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(entry_id = "p1", "Sent notification");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let line = output.lines().next().unwrap();
        assert!(line.starts_with('{') && line.ends_with('}'));
        assert!(line.contains(r#""level":"INFO""#));
        assert!(line.contains(r#""entry_id":"p1""#));
        assert!(line.contains(r#""message":"Sent notification""#));
    }

    #[test]
    fn test_default_directives_cover_all_crates() {
        let config = LogConfig::default();
        assert_eq!(
            config.default_directives(),
            "paperbot=info,paperbot_common=info,paperbot_forwarder=info,paperbot_notifier=info"
        );
    }

    #[test]
    fn test_debug_directives() {
        let config = LogConfig {
            level: Level::DEBUG,
            ..Default::default()
        };
        assert!(config.default_directives().contains("paperbot_forwarder=debug"));
    }

    #[test]
    fn test_file_path() {
        let config = LogConfig::default();
        assert_eq!(config.file_path(), PathBuf::from("logs/paper_bot.log"));
    }
}
