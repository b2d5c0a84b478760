//! Turns whatever the façade hands over into a [`LogRecord`].

use crate::domain::{LogRecord, Severity};
use serde_json::Value;

/// Input accepted by the transport for one log event.
#[derive(Debug, Clone)]
pub enum RecordInput {
    /// Already-structured record.
    Record(LogRecord),
    /// Decoded JSON value, typically an object.
    Json(Value),
    /// Raw text, usually one serialized JSON line.
    Text(String),
}

impl From<LogRecord> for RecordInput {
    fn from(record: LogRecord) -> Self {
        RecordInput::Record(record)
    }
}

impl From<Value> for RecordInput {
    fn from(value: Value) -> Self {
        RecordInput::Json(value)
    }
}

impl From<String> for RecordInput {
    fn from(text: String) -> Self {
        RecordInput::Text(text)
    }
}

impl From<&str> for RecordInput {
    fn from(text: &str) -> Self {
        RecordInput::Text(text.to_string())
    }
}

/// Produce the canonical record for `input`. Never fails.
///
/// Text that does not decode to a JSON object is kept verbatim as the
/// message of an `info` record with no context fields.
pub fn normalize(input: impl Into<RecordInput>) -> LogRecord {
    match input.into() {
        RecordInput::Record(record) => record,
        RecordInput::Json(value) => from_value(value, None),
        RecordInput::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(value) => from_value(value, Some(text)),
            Err(_) => raw_message(text),
        },
    }
}

fn from_value(value: Value, original: Option<String>) -> LogRecord {
    match value {
        Value::Object(map) => LogRecord::from_json_map(map),
        Value::String(s) if original.is_none() => raw_message(s),
        other => raw_message(original.unwrap_or_else(|| other.to_string())),
    }
}

fn raw_message(text: String) -> LogRecord {
    LogRecord {
        level: Severity::INFO,
        msg: Some(text),
        ..Default::default()
    }
}
