//! Relay wire types: downstream webhook payloads and client-facing messages.

use serde::{Deserialize, Serialize};

/// Sender name stamped on every message the relay pushes to a client.
const BOT_SENDER: &str = "bot";

/// Payload POSTed to the Rasa REST webhook: `{ "sender", "message" }`.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub sender: String,
    pub message: String,
}

/// One button attached to a bot reply (`{ "title", "payload" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub title: String,
    pub payload: String,
}

/// One element of the webhook's JSON array response. Unknown fields are kept
/// in `extra` so `/chat` can return the array as the server sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotReply {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ReplyButton>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Kind of a client-facing message. `Error` is only ever produced by the
/// relay itself, never derived from a successful webhook reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Error,
}

/// Message pushed to a WebSocket client:
/// `{ "sender": "bot", "message", "type", optional "buttons"/"image" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub sender: String,
    pub message: String,
    #[serde(rename = "type")]
    pub typ: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<ReplyButton>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ClientMessage {
    /// Plain text notice from the relay (e.g. the session welcome).
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            sender: BOT_SENDER.to_string(),
            message: message.into(),
            typ: MessageType::Text,
            buttons: None,
            image: None,
        }
    }

    /// Relay-generated failure notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            sender: BOT_SENDER.to_string(),
            message: message.into(),
            typ: MessageType::Error,
            buttons: None,
            image: None,
        }
    }

    /// Derive one client message from one webhook reply: type is `image`
    /// iff the reply carries an image, else `text`.
    pub fn from_reply(reply: BotReply) -> Self {
        let typ = if reply.image.is_some() {
            MessageType::Image
        } else {
            MessageType::Text
        };
        Self {
            sender: BOT_SENDER.to_string(),
            message: reply.text,
            typ,
            buttons: reply.buttons,
            image: reply.image,
        }
    }
}

/// Body of `POST /chat`; also the shape of an inbound WebSocket frame
/// (where `sender` is ignored in favour of the connection's session id).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_with_image_maps_to_image_type() {
        let reply: BotReply =
            serde_json::from_str(r#"{"text":"a cat","image":"https://example.com/cat.png"}"#)
                .expect("parse");
        let msg = ClientMessage::from_reply(reply);
        assert_eq!(msg.typ, MessageType::Image);
        assert_eq!(msg.sender, "bot");
        assert_eq!(msg.image.as_deref(), Some("https://example.com/cat.png"));

        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "image");
    }

    #[test]
    fn reply_without_image_maps_to_text_type() {
        let reply: BotReply = serde_json::from_str(
            r#"{"text":"pick one","buttons":[{"title":"Yes","payload":"/affirm"}]}"#,
        )
        .expect("parse");
        let msg = ClientMessage::from_reply(reply);
        assert_eq!(msg.typ, MessageType::Text);
        assert_eq!(
            msg.buttons,
            Some(vec![ReplyButton {
                title: "Yes".to_string(),
                payload: "/affirm".to_string(),
            }])
        );

        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "text");
        assert!(value.get("image").is_none());
    }

    #[test]
    fn relay_failures_use_error_type() {
        let value = serde_json::to_value(ClientMessage::error("down")).expect("serialize");
        assert_eq!(value["type"], "error");
        assert_eq!(value["sender"], "bot");
        assert_eq!(value["message"], "down");
    }

    #[test]
    fn unknown_reply_fields_survive_round_trip() {
        let raw = r#"{"text":"Hi","custom":{"kind":"card"}}"#;
        let reply: BotReply = serde_json::from_str(raw).expect("parse");
        let value = serde_json::to_value(&reply).expect("serialize");
        assert_eq!(value["text"], "Hi");
        assert_eq!(value["custom"]["kind"], "card");
    }

    #[test]
    fn empty_text_is_not_dropped_on_serialization() {
        let reply: BotReply = serde_json::from_str(r#"{"text":""}"#).expect("parse");
        let value = serde_json::to_value(&reply).expect("serialize");
        assert_eq!(value, serde_json::json!({ "text": "" }));
    }

    #[test]
    fn chat_request_fields_default_when_absent() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"hello"}"#).expect("parse");
        assert_eq!(req.message, "hello");
        assert!(req.sender.is_none());

        let req: ChatRequest = serde_json::from_str("{}").expect("parse");
        assert!(req.message.is_empty());
    }
}
