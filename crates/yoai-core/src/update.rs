//! Raw updates and the canonical [`Message`] built from them.
//!
//! The bot API hands out updates as loosely shaped JSON objects. Field names
//! have drifted over time (`chatId` vs `chat_id`, nested `chat` objects, ...),
//! so [`parse_update`] first normalizes every accepted spelling into one
//! envelope and then builds the [`Message`].
//!
//! Only the chat identifier is mandatory. Every other field is best-effort:
//! a missing or oddly typed `text` simply yields `None`.
//!
//! ```text
//! RawUpdate (any JSON) ──parse_update──▶ Message { chat_id, text, sender_id, timestamp, extra }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MalformedUpdate;

/// Keys that may carry the chat identifier, in lookup order.
const CHAT_ID_KEYS: &[&str] = &["chat_id", "chatId", "chat"];
/// Keys that may carry the sender identifier, in lookup order.
const SENDER_KEYS: &[&str] = &["sender_id", "senderId", "sender", "from"];
/// Keys that may carry the timestamp, in lookup order.
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "date", "createdAt"];
/// Keys that may carry the update identifier, in lookup order.
const UPDATE_ID_KEYS: &[&str] = &["update_id", "id"];
const TEXT_KEY: &str = "text";

// =============================================================================
// RawUpdate
// =============================================================================

/// An unprocessed update exactly as delivered by the transport.
///
/// The wrapper is transparent for serde, so a batch of updates can be
/// deserialized straight from the API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawUpdate(Value);

impl RawUpdate {
    /// Wraps a JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the update and returns the underlying JSON value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for RawUpdate {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// =============================================================================
// Message
// =============================================================================

/// The canonical, parsed form of one update.
///
/// A `Message` is immutable once built; handlers receive it behind an `Arc`
/// and read it through the accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    chat_id: String,
    text: Option<String>,
    sender_id: Option<String>,
    timestamp: Option<i64>,
    update_id: Option<String>,
    /// Raw fields not consumed by normalization, carried through unchanged.
    extra: Map<String, Value>,
}

impl Message {
    /// Creates a message for `chat_id` with no other fields set.
    ///
    /// Mostly useful for tests and for handlers that synthesize messages.
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: None,
            sender_id: None,
            timestamp: None,
            update_id: None,
            extra: Map::new(),
        }
    }

    /// Sets the message text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the sender identifier.
    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// The conversation this message belongs to.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// The message body, if the update carried one.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The sender identifier, if known.
    pub fn sender_id(&self) -> Option<&str> {
        self.sender_id.as_deref()
    }

    /// Epoch timestamp of the update, if known.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Server-side update identifier, if known.
    pub fn update_id(&self) -> Option<&str> {
        self.update_id.as_deref()
    }

    /// Additional metadata carried through from the raw update.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Looks up a single metadata field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a raw update into a [`Message`].
///
/// This is a pure function: it performs no I/O and never panics.
///
/// # Errors
///
/// Fails only when the update is not an object or its chat identifier is
/// absent or unusable. All other fields degrade to `None`, and a value that
/// cannot be normalized stays in [`Message::extra`] under its original key.
pub fn parse_update(raw: &RawUpdate) -> Result<Message, MalformedUpdate> {
    let object = raw.as_value().as_object().ok_or(MalformedUpdate::NotAnObject {
        found: json_type(raw.as_value()),
    })?;

    let mut envelope = object.clone();

    let chat_id = match take_first(&mut envelope, CHAT_ID_KEYS) {
        Some(value) => chat_id_from(&value)?,
        None => return Err(MalformedUpdate::MissingChatId),
    };

    let text = match envelope.remove(TEXT_KEY) {
        Some(Value::String(text)) => Some(text),
        Some(other) => {
            // Keep odd payloads visible to handlers instead of dropping them.
            envelope.insert(TEXT_KEY.to_string(), other);
            None
        }
        None => None,
    };

    let sender_id = take_normalized(&mut envelope, SENDER_KEYS, |v| match v {
        Value::Object(sender) => sender.get("id").and_then(identifier),
        other => identifier(other),
    });

    let timestamp = take_normalized(&mut envelope, TIMESTAMP_KEYS, epoch_seconds);

    let update_id = take_normalized(&mut envelope, UPDATE_ID_KEYS, identifier);

    Ok(Message {
        chat_id,
        text,
        sender_id,
        timestamp,
        update_id,
        extra: envelope,
    })
}

/// Removes and returns the first present key from `keys`.
///
/// Later aliases stay in the envelope so nothing is silently lost.
fn take_first(envelope: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| envelope.remove(*key))
}

/// Normalizes the first present key from `keys`.
///
/// The key is only consumed when `normalize` accepts its value; otherwise
/// it stays in the envelope untouched.
fn take_normalized<T>(
    envelope: &mut Map<String, Value>,
    keys: &[&str],
    normalize: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let key = keys.iter().find(|key| envelope.contains_key(**key))?;
    let normalized = envelope.get(*key).and_then(normalize);
    if normalized.is_some() {
        envelope.remove(*key);
    }
    normalized
}

/// Accepts integer, fractional and numeric-string epoch seconds.
///
/// Fractions are truncated toward zero.
fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| whole_seconds(n.as_f64()?)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| whole_seconds(s.parse().ok()?))
        }
        _ => None,
    }
}

fn whole_seconds(secs: f64) -> Option<i64> {
    (secs.is_finite() && secs.abs() < i64::MAX as f64).then(|| secs.trunc() as i64)
}

fn chat_id_from(value: &Value) -> Result<String, MalformedUpdate> {
    let candidate = match value {
        Value::Object(chat) => chat.get("id").ok_or(MalformedUpdate::MissingChatId)?,
        other => other,
    };

    identifier(candidate).ok_or(MalformedUpdate::InvalidChatId {
        found: json_type(candidate),
    })
}

/// Accepts non-empty strings and integers as identifiers.
fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Message, MalformedUpdate> {
        parse_update(&RawUpdate::new(value))
    }

    #[test]
    fn test_parse_minimal_update() {
        let msg = parse(json!({"chat_id": "A", "text": "/help"})).unwrap();
        assert_eq!(msg.chat_id(), "A");
        assert_eq!(msg.text(), Some("/help"));
        assert_eq!(msg.sender_id(), None);
        assert_eq!(msg.timestamp(), None);
        assert!(msg.extra().is_empty());
    }

    #[test]
    fn test_parse_camel_case_platform_shape() {
        let msg = parse(json!({
            "id": 991,
            "chatId": "chat-42",
            "text": "hello",
            "sender": {"id": "user-7", "firstName": "Ann"},
            "createdAt": 1_700_000_000
        }))
        .unwrap();

        assert_eq!(msg.chat_id(), "chat-42");
        assert_eq!(msg.text(), Some("hello"));
        assert_eq!(msg.sender_id(), Some("user-7"));
        assert_eq!(msg.timestamp(), Some(1_700_000_000));
        assert_eq!(msg.update_id(), Some("991"));
    }

    #[test]
    fn test_parse_chat_object_and_numeric_ids() {
        let msg = parse(json!({"chat": {"id": 12345}, "from": {"id": 6}})).unwrap();
        assert_eq!(msg.chat_id(), "12345");
        assert_eq!(msg.sender_id(), Some("6"));
    }

    #[test]
    fn test_parse_missing_chat_id_fails() {
        let err = parse(json!({"text": "hi"})).unwrap_err();
        assert_eq!(err, MalformedUpdate::MissingChatId);

        let err = parse(json!({"chat": {"title": "no id"}})).unwrap_err();
        assert_eq!(err, MalformedUpdate::MissingChatId);
    }

    #[test]
    fn test_parse_wrong_chat_id_type_fails() {
        for bad in [json!(null), json!(true), json!([1]), json!(""), json!(1.5)] {
            let err = parse(json!({"chat_id": bad})).unwrap_err();
            assert!(matches!(err, MalformedUpdate::InvalidChatId { .. }));
        }
    }

    #[test]
    fn test_parse_non_object_fails() {
        let err = parse(json!("just a string")).unwrap_err();
        assert_eq!(err, MalformedUpdate::NotAnObject { found: "string" });
    }

    #[test]
    fn test_parse_tolerates_odd_optional_fields() {
        let msg = parse(json!({
            "chat_id": "A",
            "text": {"rich": true},
            "timestamp": "1699999999",
            "sender_id": false
        }))
        .unwrap();

        assert_eq!(msg.text(), None);
        assert_eq!(msg.timestamp(), Some(1_699_999_999));
        assert_eq!(msg.sender_id(), None);
        // Non-string text stays reachable as metadata.
        assert_eq!(msg.get("text"), Some(&json!({"rich": true})));
    }

    #[test]
    fn test_parse_keeps_unusable_fields_as_metadata() {
        let msg = parse(json!({
            "chat_id": "A",
            "sender_id": false,
            "date": [1],
            "update_id": {"seq": 4}
        }))
        .unwrap();

        assert_eq!(msg.sender_id(), None);
        assert_eq!(msg.timestamp(), None);
        assert_eq!(msg.update_id(), None);
        assert_eq!(msg.get("sender_id"), Some(&json!(false)));
        assert_eq!(msg.get("date"), Some(&json!([1])));
        assert_eq!(msg.get("update_id"), Some(&json!({"seq": 4})));
        assert_eq!(msg.extra().len(), 3);
    }

    #[test]
    fn test_parse_fractional_timestamps() {
        let msg = parse(json!({"chat_id": "A", "timestamp": 1_700_000_000.75})).unwrap();
        assert_eq!(msg.timestamp(), Some(1_700_000_000));
        assert!(msg.get("timestamp").is_none());

        let msg = parse(json!({"chat_id": "A", "createdAt": " 1700000000.5 "})).unwrap();
        assert_eq!(msg.timestamp(), Some(1_700_000_000));

        let msg = parse(json!({"chat_id": "A", "date": "yesterday"})).unwrap();
        assert_eq!(msg.timestamp(), None);
        assert_eq!(msg.get("date"), Some(&json!("yesterday")));
    }

    #[test]
    fn test_parse_carries_metadata_through() {
        let msg = parse(json!({
            "chat_id": "A",
            "text": "hi",
            "messageType": "text",
            "attachments": [{"url": "https://example.com/a.png"}]
        }))
        .unwrap();

        assert_eq!(msg.get("messageType"), Some(&json!("text")));
        assert_eq!(msg.extra().len(), 2);
        assert!(msg.get("chat_id").is_none());
    }
}
