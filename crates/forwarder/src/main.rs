use std::sync::Arc;

use chrono::Utc;
use clap::Parser;

use paperbot_common::clock::{Clock, SystemClock};
use paperbot_common::config::{AppConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use paperbot_common::logging;
use paperbot_common::time::format_beijing;
use paperbot_common::types::PollState;
use paperbot_forwarder::cli::Cli;
use paperbot_forwarder::demo::send_sample_messages;
use paperbot_forwarder::feed::HttpFeedSource;
use paperbot_forwarder::forwarder::Forwarder;
use paperbot_forwarder::schedule::IntervalTicker;
use paperbot_notifier::{FeishuSender, HttpTransport, WebhookConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.test_webhook {
        return test_webhook(&cli).await;
    }

    let config = AppConfig::from_raw(cli.to_raw_config(), Utc::now())?;
    let log_config = config.log_config();
    let _guard = logging::init(&log_config)?;

    tracing::info!(log_file = %log_config.file_path().display(), "Starting paper notification bot...");
    tracing::info!(
        rss_url = %config.rss_url,
        signed = config.webhook_secret.is_some(),
        poll_interval_secs = config.poll_interval.as_secs(),
        http_timeout_secs = config.http_timeout.as_secs(),
        "Configuration loaded"
    );
    tracing::info!(
        reference_beijing = %format_beijing(config.start_watermark),
        reference_utc = %config.start_watermark,
        "Reference time set"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sender = FeishuSender::with_clock(
        WebhookConfig::new(config.webhook_url.clone(), config.webhook_secret.clone()),
        HttpTransport::new(config.http_timeout)?,
        clock.clone(),
    );
    let source = HttpFeedSource::new(config.http_timeout)?;
    let forwarder = Forwarder::new(config.rss_url.clone(), source, sender, clock);

    let mut ticker = IntervalTicker::new(config.poll_interval);
    let state = PollState::new(config.start_watermark);

    tokio::select! {
        _ = forwarder.run(&mut ticker, state) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping...");
        }
    }

    tracing::info!("Paper notification bot stopped.");
    Ok(())
}

async fn test_webhook(cli: &Cli) -> anyhow::Result<()> {
    let _guard = logging::init(&cli.log_config())?;

    let timeout = std::time::Duration::from_secs(
        cli.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
    );
    let sender = FeishuSender::new(
        WebhookConfig::new(cli.webhook_url.clone(), cli.webhook_secret.clone()),
        HttpTransport::new(timeout)?,
    );

    for (kind, result) in send_sample_messages(&sender).await {
        match result {
            Ok(response) => tracing::info!(kind, response = %response, "Sample message sent"),
            Err(failure) => tracing::error!(
                kind,
                error = %failure,
                payload = %failure.payload,
                "Sample message failed"
            ),
        }
    }

    Ok(())
}
