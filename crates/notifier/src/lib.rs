//! Feishu/Lark custom bot webhook client.
//!
//! Builds text, rich-post and interactive-card messages, signs them when the
//! bot has a secret configured, and POSTs them to the webhook. Delivery never
//! raises: failures come back as a [`DeliveryFailure`] value carrying the
//! attempted payload.

pub mod error;
pub mod payload;
pub mod sender;
pub mod signature;
pub mod transport;

pub use error::{DeliveryFailure, TransportError};
pub use payload::MessagePayload;
pub use sender::{FeishuSender, SendResult, WebhookConfig, platform_rejection};
pub use signature::Signature;
pub use transport::{HttpTransport, WebhookTransport};
