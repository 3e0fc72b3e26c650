//! The poll → deliver → advance-watermark loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use paperbot_common::clock::Clock;
use paperbot_common::types::{FeedEntry, PollState};
use paperbot_notifier::{FeishuSender, HttpTransport, WebhookTransport, platform_rejection};

use crate::card::notification_card;
use crate::feed::FeedSource;
use crate::poller::poll_new;
use crate::schedule::Ticker;

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// New entries found by the poll.
    pub found: usize,
    /// Entries the webhook accepted.
    pub delivered: usize,
    /// Entries whose delivery failed (transport, HTTP status or platform rejection).
    pub failed: usize,
    /// Set when the feed could not be fetched or parsed.
    pub feed_error: Option<String>,
}

/// Forwards new entries of one feed to one Feishu bot.
pub struct Forwarder<S, T = HttpTransport> {
    feed_url: String,
    source: S,
    sender: FeishuSender<T>,
    clock: Arc<dyn Clock>,
}

impl<S: FeedSource, T: WebhookTransport> Forwarder<S, T> {
    pub fn new(
        feed_url: impl Into<String>,
        source: S,
        sender: FeishuSender<T>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            feed_url: feed_url.into(),
            source,
            sender,
            clock,
        }
    }

    /// Run one cycle, updating `state` in place.
    ///
    /// Every new entry is marked sent after its delivery attempt, successful or
    /// not, and the watermark moves to "now" whether or not the poll worked.
    /// A failed delivery is therefore dropped, not retried.
    pub async fn run_cycle(&self, state: &mut PollState) -> CycleReport {
        let mut report = CycleReport::default();

        match poll_new(&self.source, &self.feed_url, state.watermark, &state.sent_ids).await {
            Ok(entries) if entries.is_empty() => {
                tracing::debug!("No new notifications");
            }
            Ok(entries) => {
                tracing::info!(count = entries.len(), "Found new notifications");
                report.found = entries.len();

                for entry in entries {
                    if self.deliver(&entry).await {
                        report.delivered += 1;
                    } else {
                        report.failed += 1;
                    }
                    state.mark_sent(entry.id);
                }
            }
            Err(e) => {
                tracing::error!(feed_url = %self.feed_url, error = %e, "Failed to fetch feed");
                report.feed_error = Some(e.to_string());
            }
        }

        state.advance_watermark(self.clock.now());
        tracing::debug!(watermark = %state.watermark, "Updated watermark");

        report
    }

    /// Run cycles until the ticker stops. Returns the final state.
    ///
    /// A panicking cycle is logged and treated like a failed poll. Entries
    /// marked sent before the panic stay marked, and the watermark still
    /// advances.
    pub async fn run(&self, ticker: &mut impl Ticker, mut state: PollState) -> PollState {
        while ticker.tick().await {
            tracing::debug!("Checking for new notifications...");

            let outcome = AssertUnwindSafe(self.run_cycle(&mut state))
                .catch_unwind()
                .await;
            match outcome {
                Ok(report) => {
                    if report.found > 0 || report.feed_error.is_some() {
                        tracing::info!(
                            found = report.found,
                            delivered = report.delivered,
                            failed = report.failed,
                            feed_error = report.feed_error.is_some(),
                            "Poll cycle finished"
                        );
                    }
                }
                Err(panic) => {
                    tracing::error!(
                        error = %panic_message(panic.as_ref()),
                        "Poll cycle aborted unexpectedly; continuing on schedule"
                    );
                    state.advance_watermark(self.clock.now());
                }
            }
        }

        state
    }

    async fn deliver(&self, entry: &FeedEntry) -> bool {
        if entry.published > self.clock.now() {
            // Not filtered: entries are only bounded below by the watermark.
            tracing::warn!(
                entry_id = %entry.id,
                published = %entry.published,
                "Entry is dated in the future"
            );
        }

        tracing::debug!(entry_id = %entry.id, title = %entry.title, "Processing notification");

        match self.sender.send_card(notification_card(entry)).await {
            Ok(response) => {
                if let Some(rejection) = platform_rejection(&response) {
                    tracing::warn!(
                        entry_id = %entry.id,
                        rejection = %rejection,
                        "Webhook rejected notification; entry will not be retried"
                    );
                    return false;
                }
                tracing::info!(title = %entry.title, "Sent notification");
                tracing::debug!(response = %response, "Feishu response");
                true
            }
            Err(failure) => {
                tracing::error!(
                    entry_id = %entry.id,
                    error = %failure,
                    "Failed to deliver notification; entry will not be retried"
                );
                false
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
