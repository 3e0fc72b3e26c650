use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single feed entry, normalized for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Feed-provided id (RSS `guid`, Atom `id`), or the link when the feed has none.
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Publication time, always in UTC.
    pub published: DateTime<Utc>,
    pub link: Option<String>,
}

/// Dedup state for one continuous run of the forwarder.
///
/// Lives only in memory: a restart starts over from the configured reference
/// time with an empty sent-id set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    /// Only entries published strictly after this instant are candidates.
    pub watermark: DateTime<Utc>,
    /// Ids of entries already handed to the webhook during this run.
    pub sent_ids: HashSet<String>,
}

impl PollState {
    pub fn new(watermark: DateTime<Utc>) -> Self {
        Self {
            watermark,
            sent_ids: HashSet::new(),
        }
    }

    pub fn is_sent(&self, entry_id: &str) -> bool {
        self.sent_ids.contains(entry_id)
    }

    /// Record a delivery attempt. Returns `false` if the id was already present.
    pub fn mark_sent(&mut self, entry_id: impl Into<String>) -> bool {
        self.sent_ids.insert(entry_id.into())
    }

    /// Move the watermark to `now`. The watermark never moves backwards, so a
    /// clock that steps back leaves it where it was.
    pub fn advance_watermark(&mut self, now: DateTime<Utc>) {
        if now > self.watermark {
            self.watermark = now;
        }
    }
}
