//! The wire envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One JSON object exchanged over a connection.
///
/// `type` discriminates; `callbackId` is an opaque correlation token set by
/// the client and echoed on the matching reply. All other fields are kept
/// as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Correlation token.
    #[serde(
        rename = "callbackId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub callback_id: Option<Value>,
    /// Type-specific payload fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// An envelope with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            callback_id: None,
            fields: Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Set the correlation token.
    pub fn with_callback(mut self, callback_id: Option<Value>) -> Self {
        self.callback_id = callback_id;
        self
    }

    /// Echo the correlation token of `request`.
    pub fn in_reply_to(self, request: &Envelope) -> Self {
        self.with_callback(request.callback_id.clone())
    }

    /// A payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A string payload field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Deserialize the payload fields into `T`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_callback_is_omitted_when_absent() {
        let env = Envelope::new("hug_received").with("hug", json!({"id": "h1"}));
        let raw = serde_json::to_value(&env).unwrap();
        assert_eq!(raw, json!({"type": "hug_received", "hug": {"id": "h1"}}));
    }

    #[test]
    fn test_reply_echoes_callback_verbatim() {
        let request: Envelope =
            serde_json::from_value(json!({"type": "ping", "callbackId": 17})).unwrap();
        let reply = Envelope::new("pong").in_reply_to(&request);
        assert_eq!(reply.callback_id, Some(json!(17)));
    }

    #[test]
    fn test_payload_reads_flattened_fields() {
        #[derive(Deserialize)]
        struct Req {
            mood: String,
        }
        let env: Envelope =
            serde_json::from_value(json!({"type": "update_mood", "mood": "good"})).unwrap();
        assert_eq!(env.payload::<Req>().unwrap().mood, "good");
        assert!(env.field("type").is_none());
    }
}
