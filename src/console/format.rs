use crate::domain::{FieldValue, LogRecord, STANDARD_FIELDS, Severity};
use serde_json::Value;
use std::collections::HashSet;

pub const RESET: &str = "\x1b[0m";
pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const YELLOW: &str = "\x1b[33m";
pub const GREEN: &str = "\x1b[32m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

/// Rendered in place of a value that could not be converted to text.
pub const VALUE_PLACEHOLDER: &str = "[value]";

const INDENT: &str = "  ";

/// ANSI color for a severity; codes off the ladder get the reset code.
pub fn color_for(level: Severity) -> &'static str {
    match level.code() {
        60 | 50 => RED,
        45 => CYAN,
        40 => YELLOW,
        30 => GREEN,
        20 => BLUE,
        10 => GREY,
        _ => RESET,
    }
}

/// Field names left out of the console context block.
///
/// Always contains the standard record fields; configuration adds the names
/// of its static fields, which are known to the reader already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipFields(HashSet<String>);

impl SkipFields {
    pub fn standard() -> Self {
        Self(STANDARD_FIELDS.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut skip = Self::standard();
        skip.0.extend(extra.into_iter().map(Into::into));
        skip
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SkipFields {
    fn default() -> Self {
        Self::standard()
    }
}

/// Render a record for humans: colored headline, then the indented context block.
pub fn render(record: &LogRecord, skip: &SkipFields, color: bool) -> String {
    let (open, close) = if color {
        (color_for(record.level), RESET)
    } else {
        ("", "")
    };

    let headline = record.msg.as_deref().unwrap_or_default();
    let mut out = format!("{open}{headline}{close}");

    let context = context_block(record, skip);
    if !context.is_empty() {
        out.push('\n');
        out.push_str(&indent(&context, false));
    }
    out
}

/// One `key: value` line per non-skipped field, in insertion order.
pub fn context_block(record: &LogRecord, skip: &SkipFields) -> String {
    record
        .fields
        .iter()
        .filter(|(key, _)| !skip.contains(key))
        .map(|(key, value)| format!("{key}: {}", indent(&value_as_string(value), true)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text form of a context value. Never fails.
pub fn value_as_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Timestamp(ts) => FieldValue::iso8601(ts),
        FieldValue::Json(Value::String(s)) => s.clone(),
        FieldValue::Json(v @ (Value::Object(_) | Value::Array(_) | Value::Null)) => {
            serde_json::to_string_pretty(v).unwrap_or_else(|_| VALUE_PLACEHOLDER.to_string())
        }
        FieldValue::Json(other) => other.to_string(),
    }
}

/// Indent every line after the first by two spaces, and the first too
/// unless `skip_first_row` is set.
pub fn indent(s: &str, skip_first_row: bool) -> String {
    if s.is_empty() {
        return String::new();
    }
    let joined = s.split('\n').collect::<Vec<_>>().join(&format!("\n{INDENT}"));
    if skip_first_row {
        joined
    } else {
        format!("{INDENT}{joined}")
    }
}
