use serde_json::{Value, json};

use paperbot_common::time::format_beijing;
use paperbot_common::types::FeedEntry;

pub const CARD_TITLE: &str = "New Paper Notification";

/// Interactive card announcing one feed entry.
pub fn notification_card(entry: &FeedEntry) -> Value {
    let mut elements = vec![
        markdown_block(&format!("**Title**\n{}", entry.title)),
        markdown_block(&format!("**Content**\n{}", entry.summary)),
        markdown_block(&format!(
            "**Published Time**\n{}",
            format_beijing(entry.published)
        )),
    ];

    if let Some(link) = &entry.link {
        elements.push(json!({
            "tag": "action",
            "actions": [
                {
                    "tag": "button",
                    "text": {"content": "View Details", "tag": "lark_md"},
                    "url": link,
                    "type": "default"
                }
            ]
        }));
    }

    json!({
        "header": {
            "title": {"content": CARD_TITLE, "tag": "plain_text"},
            "template": "blue"
        },
        "elements": elements
    })
}

fn markdown_block(content: &str) -> Value {
    json!({
        "tag": "div",
        "text": {"content": content, "tag": "lark_md"}
    })
}
