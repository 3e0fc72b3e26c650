//! Message bodies understood by the Feishu bot webhook.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Language key used for post messages when none is given.
pub const DEFAULT_POST_LANGUAGE: &str = "zh_cn";

/// Mention token that notifies everyone in the chat.
pub const MENTION_ALL: &str = r#"<at user_id="all"></at>"#;

/// Top-level webhook message, tagged by `msg_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msg_type", rename_all = "snake_case")]
pub enum MessagePayload {
    Text {
        content: TextContent,
    },
    Post {
        content: PostContent,
    },
    #[serde(rename = "interactive")]
    Card {
        card: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostContent {
    /// Keyed by language tag (`zh_cn`, `en_us`, ...).
    pub post: BTreeMap<String, PostBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostBody {
    pub title: String,
    /// Paragraphs of inline elements (`{"tag": "text", ...}`, `{"tag": "a", ...}`).
    /// Passed through as given.
    pub content: Vec<Vec<Value>>,
}

impl MessagePayload {
    /// Text message with mention tokens in front of the body.
    ///
    /// Produces `<at user_id="all"></at> <at user_id="u1"></at> ... body` when
    /// both kinds of mention are requested.
    pub fn text(text: &str, mentioned_user_ids: &[String], mention_all: bool) -> Self {
        let mut text = text.to_string();

        if !mentioned_user_ids.is_empty() {
            let mentions = mentioned_user_ids
                .iter()
                .map(|id| mention_token(id))
                .collect::<Vec<_>>()
                .join(" ");
            text = format!("{mentions} {text}");
        }

        if mention_all {
            text = format!("{MENTION_ALL} {text}");
        }

        MessagePayload::Text {
            content: TextContent { text },
        }
    }

    /// Rich-text post under a single language key.
    pub fn post(title: &str, content: Vec<Vec<Value>>, language: &str) -> Self {
        let mut post = BTreeMap::new();
        post.insert(
            language.to_string(),
            PostBody {
                title: title.to_string(),
                content,
            },
        );
        MessagePayload::Post {
            content: PostContent { post },
        }
    }

    pub fn card(card: Value) -> Self {
        MessagePayload::Card { card }
    }

    /// The `msg_type` discriminator of this payload.
    pub fn msg_type(&self) -> &'static str {
        match self {
            MessagePayload::Text { .. } => "text",
            MessagePayload::Post { .. } => "post",
            MessagePayload::Card { .. } => "interactive",
        }
    }
}

/// `<at user_id="ID"></at>`
pub fn mention_token(user_id: &str) -> String {
    format!(r#"<at user_id="{user_id}"></at>"#)
}
