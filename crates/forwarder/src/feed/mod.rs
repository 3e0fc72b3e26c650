//! Feed fetching and RSS/Atom parsing.

mod client;
mod parser;

use async_trait::async_trait;
use thiserror::Error;

use paperbot_common::types::FeedEntry;

pub use client::HttpFeedSource;
pub use parser::{parse_feed, parse_feed_date};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse feed: {0}")]
    Parse(String),
}

/// Anything that can produce the current entries of a feed, in feed order.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError>;
}
