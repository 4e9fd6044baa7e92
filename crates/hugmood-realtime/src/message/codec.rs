//! Text frame <-> envelope conversion.

use serde_json::Value;

use crate::error::DecodeError;

use super::envelope::Envelope;

/// Parse a text frame into an envelope.
///
/// Rejects oversized frames, invalid JSON, non-objects and objects without a
/// string `type`.
pub fn decode(raw: &str, max_bytes: usize) -> Result<Envelope, DecodeError> {
    if raw.len() > max_bytes {
        return Err(DecodeError::TooLarge {
            size: raw.len(),
            max: max_bytes,
        });
    }

    let mut object = match serde_json::from_str::<Value>(raw)? {
        Value::Object(object) => object,
        _ => return Err(DecodeError::NotAnObject),
    };

    let kind = match object.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(DecodeError::MissingType),
    };
    let callback_id = object.remove("callbackId").filter(|v| !v.is_null());

    Ok(Envelope {
        kind,
        callback_id,
        fields: object,
    })
}

/// Serialize an envelope. Failures are logged and yield `None`.
pub fn encode(envelope: &Envelope) -> Option<String> {
    match serde_json::to_string(envelope) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(message_type = %envelope.kind, error = %e, "Failed to encode envelope");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAX: usize = 1024;

    #[test]
    fn test_decode_valid() {
        let env = decode(r#"{"type":"send_hug","recipientId":"u2","callbackId":"c2"}"#, MAX)
            .unwrap();
        assert_eq!(env.kind, "send_hug");
        assert_eq!(env.callback_id, Some(json!("c2")));
        assert_eq!(env.str_field("recipientId"), Some("u2"));
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(matches!(decode("[1,2]", MAX), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("\"ping\"", MAX), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode("not json", MAX), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_requires_string_type() {
        assert!(matches!(decode(r#"{"mood":"good"}"#, MAX), Err(DecodeError::MissingType)));
        assert!(matches!(decode(r#"{"type":7}"#, MAX), Err(DecodeError::MissingType)));
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let raw = format!(r#"{{"type":"ping","pad":"{}"}}"#, "x".repeat(MAX));
        assert!(matches!(decode(&raw, MAX), Err(DecodeError::TooLarge { .. })));
    }

    #[test]
    fn test_encode_keeps_wire_names() {
        let env = Envelope::new("pong")
            .with("timestamp", 5)
            .with_callback(Some(json!("c1")));
        let text = encode(&env).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json!({"type": "pong", "timestamp": 5, "callbackId": "c1"}));
    }
}
