use std::collections::HashSet;

use chrono::{DateTime, Utc};

use paperbot_common::time::format_beijing;
use paperbot_common::types::FeedEntry;

use crate::feed::{FeedError, FeedSource};

/// Fetch `feed_url` and return the entries that still need delivering.
///
/// Fetch and parse failures are returned to the caller, which treats them as
/// "nothing new this cycle". `sent_ids` is only read; the caller records
/// deliveries.
pub async fn poll_new(
    source: &impl FeedSource,
    feed_url: &str,
    watermark: DateTime<Utc>,
    sent_ids: &HashSet<String>,
) -> Result<Vec<FeedEntry>, FeedError> {
    let entries = source.fetch(feed_url).await?;
    tracing::debug!(
        watermark_utc = %watermark,
        watermark_beijing = %format_beijing(watermark),
        entries = entries.len(),
        "Filtering feed entries"
    );
    Ok(select_new(entries, watermark, sent_ids))
}

/// Keep entries not yet sent this run and published strictly after `watermark`,
/// preserving feed order.
pub fn select_new(
    entries: Vec<FeedEntry>,
    watermark: DateTime<Utc>,
    sent_ids: &HashSet<String>,
) -> Vec<FeedEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            if sent_ids.contains(&entry.id) {
                tracing::debug!(entry_id = %entry.id, "Already sent this run");
                return false;
            }

            let is_new = entry.published > watermark;
            tracing::debug!(
                entry_id = %entry.id,
                title = %entry.title,
                published_utc = %entry.published,
                published_beijing = %format_beijing(entry.published),
                is_new,
                "Checked feed entry"
            );
            is_new
        })
        .collect()
}
