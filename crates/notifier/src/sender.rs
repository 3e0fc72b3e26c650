use std::sync::Arc;

use serde_json::Value;

use paperbot_common::clock::{Clock, SystemClock};

use crate::error::DeliveryFailure;
use crate::payload::{DEFAULT_POST_LANGUAGE, MessagePayload};
use crate::signature::Signature;
use crate::transport::{HttpTransport, WebhookTransport};

/// Parsed webhook response on success, the failed attempt otherwise.
pub type SendResult = Result<Value, DeliveryFailure>;

/// Where and how to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    endpoint: String,
    secret: Option<String>,
}

impl WebhookConfig {
    /// An empty secret is treated as no secret.
    pub fn new(endpoint: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_signed(&self) -> bool {
        self.secret.is_some()
    }
}

/// Sends messages to one Feishu custom bot.
pub struct FeishuSender<T = HttpTransport> {
    config: WebhookConfig,
    transport: T,
    clock: Arc<dyn Clock>,
}

impl<T: WebhookTransport> FeishuSender<T> {
    pub fn new(config: WebhookConfig, transport: T) -> Self {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    /// Use `clock` for signature timestamps.
    pub fn with_clock(config: WebhookConfig, transport: T, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            transport,
            clock,
        }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    pub async fn send_text(
        &self,
        text: &str,
        mentioned_user_ids: &[String],
        mention_all: bool,
    ) -> SendResult {
        self.send(&MessagePayload::text(text, mentioned_user_ids, mention_all))
            .await
    }

    /// Rich-text post; `language` defaults to `zh_cn`.
    pub async fn send_post(
        &self,
        title: &str,
        content: Vec<Vec<Value>>,
        language: Option<&str>,
    ) -> SendResult {
        let language = language.unwrap_or(DEFAULT_POST_LANGUAGE);
        self.send(&MessagePayload::post(title, content, language))
            .await
    }

    pub async fn send_card(&self, card: Value) -> SendResult {
        self.send(&MessagePayload::card(card)).await
    }

    /// Sign (when a secret is set) and POST a payload.
    ///
    /// Never returns early with a raised error: every failure is folded into
    /// a [`DeliveryFailure`] carrying the body that was attempted.
    pub async fn send(&self, payload: &MessagePayload) -> SendResult {
        let mut body = serde_json::to_value(payload)
            .map_err(|e| DeliveryFailure::new(e, Value::Null))?;

        if let Some(secret) = &self.config.secret {
            let timestamp = self.clock.now().timestamp();
            match Signature::compute(timestamp, secret) {
                Ok(signature) => signature.apply_to(&mut body),
                Err(e) => return Err(DeliveryFailure::new(e, body)),
            }
        }

        match self.transport.post_json(self.config.endpoint(), &body).await {
            Ok(response) => {
                tracing::debug!(
                    msg_type = payload.msg_type(),
                    response = %response,
                    "Webhook accepted message"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::error!(
                    msg_type = payload.msg_type(),
                    error = %e,
                    "Failed to send message"
                );
                Err(DeliveryFailure::new(e, body))
            }
        }
    }
}

/// Platform-level rejection in an otherwise successful (HTTP 2xx) response.
///
/// Feishu answers `{"code": 0, "msg": "success", ...}` on success; older bots
/// answer `{"StatusCode": 0, "StatusMessage": "success"}`. Anything else
/// (e.g. `code: 19021`, sign match fail) is reported here.
pub fn platform_rejection(response: &Value) -> Option<String> {
    let (code, message) = if let Some(code) = response.get("code").and_then(Value::as_i64) {
        (code, response.get("msg"))
    } else if let Some(code) = response.get("StatusCode").and_then(Value::as_i64) {
        (code, response.get("StatusMessage"))
    } else {
        return None;
    };

    if code == 0 {
        return None;
    }

    let message = message.and_then(Value::as_str).unwrap_or("unknown error");
    Some(format!("code {code}: {message}"))
}
