//! Sample messages for checking a webhook by hand (`paperbot --test-webhook`).

use serde_json::{Value, json};

use paperbot_notifier::{FeishuSender, SendResult, WebhookTransport};

/// Send one message of each kind and return the results in order.
pub async fn send_sample_messages<T: WebhookTransport>(
    sender: &FeishuSender<T>,
) -> Vec<(&'static str, SendResult)> {
    let text = sender
        .send_text("Hello, this is a test message!", &[], false)
        .await;

    let post = sender
        .send_post(
            "Project Update",
            vec![vec![
                json!({"tag": "text", "text": "Project status: "}),
                json!({"tag": "a", "text": "View Details", "href": "https://open.feishu.cn"}),
            ]],
            None,
        )
        .await;

    let card = sender.send_card(sample_card()).await;

    vec![("text", text), ("post", post), ("card", card)]
}

fn sample_card() -> Value {
    json!({
        "header": {
            "title": {"content": "Notification", "tag": "plain_text"}
        },
        "elements": [
            {
                "tag": "div",
                "text": {
                    "content": "**Important Update**\nSomething requires your attention.",
                    "tag": "lark_md"
                }
            }
        ]
    })
}
