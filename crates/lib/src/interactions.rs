//! Discord interaction wire types and the hosting trigger seam.
//!
//! An inbound trigger event carries raw headers and body; once the signature
//! checks out the body parses into an [`Interaction`]. Synchronous replies are
//! either a raw [`TriggerResponse`] (rejections) or a bare
//! [`InteractionResponse`] object (`{"type", "data"?}`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interaction type: handshake ping.
pub const INTERACTION_PING: u8 = 1;
/// Interaction type: slash-command invocation.
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;

/// Response type: pong (handshake reply).
pub const RESPONSE_PONG: u8 = 1;
/// Response type: immediate channel message.
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
/// Response type: deferred channel message (placeholder, edited later).
pub const RESPONSE_DEFERRED_CHANNEL_MESSAGE: u8 = 5;

/// One inbound interaction: handshake ping or slash-command invocation.
/// `id` + `token` identify the interaction for follow-up delivery; the token
/// is only valid for a bounded window after receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub token: String,
    /// Channel the command was invoked in. Used as the durable
    /// conversation-memory key when present.
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

/// Command payload: invoked command name and its option values.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Option<Vec<OptionValue>>,
}

/// A single option value as sent by the platform (`{"name", "value"}`).
#[derive(Debug, Clone, Deserialize)]
pub struct OptionValue {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl InteractionData {
    /// Flatten the (possibly absent) options list into a name → string map.
    /// Non-string values are rendered with their JSON representation.
    pub fn options_map(&self) -> HashMap<String, String> {
        self.options
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|o| {
                let value = match o.value.as_str() {
                    Some(s) => s.to_string(),
                    None => o.value.to_string(),
                };
                (o.name.clone(), value)
            })
            .collect()
    }
}

/// Bare interaction response object: `{"type", "data"?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

/// Message content for channel-message and deferred responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseData {
    pub content: String,
}

impl InteractionResponse {
    /// `{"type": 1}` — handshake pong.
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    /// `{"type": 4, "data": {"content"}}` — immediate synchronous reply.
    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
            }),
        }
    }

    /// `{"type": 5, "data": {"content"}}` — deferred placeholder.
    pub fn deferred(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_DEFERRED_CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
            }),
        }
    }
}

/// Inbound event from the hosting trigger: HTTP headers plus the raw body.
/// Header lookup must go through [`TriggerEvent::header`], which normalizes
/// names to lowercase (API gateways mangle header casing).
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl TriggerEvent {
    pub fn new(headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        let wanted = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == wanted)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response for rejected requests, in the hosting environment's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl TriggerResponse {
    fn empty(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            body: String::new(),
            cookies: Vec::new(),
            is_base64_encoded: false,
        }
    }

    /// 401 with an empty body: signature missing or invalid.
    pub fn unauthorized() -> Self {
        Self::empty(401)
    }

    /// 400 with an empty body: verified request whose body is not a valid
    /// interaction payload.
    pub fn bad_request() -> Self {
        Self::empty(400)
    }

    /// 500 with an empty body: a platform API call required for the
    /// synchronous reply failed (e.g. registration during handshake).
    pub fn server_error() -> Self {
        Self::empty(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_flatten_to_name_value_map() {
        let data: InteractionData = serde_json::from_value(serde_json::json!({
            "name": "ask",
            "options": [
                {"name": "message", "value": "hello"},
                {"name": "count", "value": 3}
            ]
        }))
        .unwrap();
        let opts = data.options_map();
        assert_eq!(opts.get("message").map(String::as_str), Some("hello"));
        assert_eq!(opts.get("count").map(String::as_str), Some("3"));
    }

    #[test]
    fn absent_options_flatten_to_empty_map() {
        let data: InteractionData =
            serde_json::from_value(serde_json::json!({"name": "ask"})).unwrap();
        assert!(data.options_map().is_empty());
    }

    #[test]
    fn interaction_parses_ping_without_data() {
        let i: Interaction = serde_json::from_str(r#"{"type":1,"id":"42","token":"t"}"#).unwrap();
        assert_eq!(i.kind, INTERACTION_PING);
        assert_eq!(i.id, "42");
        assert!(i.data.is_none());
    }

    #[test]
    fn pong_serializes_without_data_field() {
        let json = serde_json::to_string(&InteractionResponse::pong()).unwrap();
        assert_eq!(json, r#"{"type":1}"#);
    }

    #[test]
    fn unauthorized_uses_hosting_field_names() {
        let v = serde_json::to_value(TriggerResponse::unauthorized()).unwrap();
        assert_eq!(v.get("statusCode").and_then(|s| s.as_u64()), Some(401));
        assert_eq!(v.get("body").and_then(|b| b.as_str()), Some(""));
        assert_eq!(
            v.get("isBase64Encoded").and_then(|b| b.as_bool()),
            Some(false)
        );
        assert!(v.get("cookies").map(|c| c.is_array()).unwrap_or(false));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("X-Signature-Ed25519".to_string(), "abc".to_string());
        let event = TriggerEvent::new(headers, "{}");
        assert_eq!(event.header("x-signature-ed25519"), Some("abc"));
    }
}
