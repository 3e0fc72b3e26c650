use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by a [`crate::WebhookTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Webhook returned malformed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// A delivery that did not go through.
///
/// Serializes as `{"error": ..., "payload": ...}` where `payload` is the exact
/// body that was (or would have been) posted, signature fields included.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{error}")]
pub struct DeliveryFailure {
    pub error: String,
    pub payload: Value,
}

impl DeliveryFailure {
    pub fn new(error: impl ToString, payload: Value) -> Self {
        Self {
            error: error.to_string(),
            payload,
        }
    }
}
