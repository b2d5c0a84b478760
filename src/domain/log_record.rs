use super::severity::Severity;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field names the record carries as dedicated attributes.
///
/// They are always rendered separately from the context block and are never
/// stored in [`Fields`].
pub const STANDARD_FIELDS: [&str; 5] = ["level", "time", "pid", "hostname", "msg"];

/// A single context value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// ISO-8601 rendering used for timestamps everywhere (millisecond precision, `Z`).
    pub fn iso8601(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Json(value) => value.serialize(serializer),
            FieldValue::Timestamp(ts) => serializer.serialize_str(&Self::iso8601(ts)),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Json(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(ts)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Json(Value::String(s.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Json(Value::String(s))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Json(Value::Bool(b))
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Json(Value::from(n))
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Json(Value::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Json(Value::from(n))
    }
}

/// Insertion-ordered context fields.
///
/// Inserting an existing key replaces its value in place, so the first
/// insertion decides the rendering position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(IndexMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merge `other` on top of `self`; later values win.
    pub fn merge(&mut self, other: &Fields) {
        self.0.reserve(other.len());
        for (key, value) in other {
            self.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = indexmap::map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        let mut fields = Fields::with_capacity(map.len());
        for (key, value) in map {
            fields.insert(key, value);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Fields::from)
    }
}

/// One emitted log event.
///
/// Serializes to the flat JSON object ingestion endpoints expect:
/// `level`, `time` (epoch milliseconds), `pid`, `hostname`, the context
/// fields in insertion order, then `msg`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    pub level: Severity,
    pub msg: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub pid: Option<u32>,
    pub hostname: Option<String>,
    pub fields: Fields,
    /// Standard fields whose decoded value differs from the typed attribute,
    /// e.g. `"level": "audit"` or `"msg": {..}`. Serialized in place of the
    /// attribute so the wire body matches what the emitter wrote.
    pub verbatim: Map<String, Value>,
}

impl LogRecord {
    pub fn new(level: Severity, msg: impl Into<String>) -> Self {
        Self {
            level,
            msg: Some(msg.into()),
            ..Default::default()
        }
    }

    /// Attach a context field. Standard field names are ignored since they
    /// have dedicated attributes.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let key = key.into();
        if !STANDARD_FIELDS.contains(&key.as_str()) {
            self.fields.insert(key, value);
        }
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self.verbatim.remove("time");
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self.verbatim.remove("pid");
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self.verbatim.remove("hostname");
        self
    }

    /// Build a record from a decoded JSON object.
    ///
    /// Standard fields are lifted into their attributes; anything else lands
    /// in `fields` in its original order. A missing or unreadable `level`
    /// becomes `info` and unreadable `time`/`pid`/`hostname` values leave the
    /// attribute empty, but any standard value that the typed attribute does
    /// not reproduce exactly is kept in `verbatim`.
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        let mut record = LogRecord {
            fields: Fields::with_capacity(map.len()),
            ..Default::default()
        };
        for (key, value) in map {
            let typed = match key.as_str() {
                "level" => {
                    let level = severity_from_json(&value);
                    record.level = level.unwrap_or_default();
                    level.map(|l| Value::from(l.code()))
                }
                "msg" => {
                    record.msg = message_from_json(&value);
                    record.msg.clone().map(Value::String)
                }
                "time" => {
                    record.time = time_from_json(&value);
                    record.time.map(|t| Value::from(t.timestamp_millis()))
                }
                "pid" => {
                    record.pid = value.as_u64().and_then(|pid| u32::try_from(pid).ok());
                    record.pid.map(Value::from)
                }
                "hostname" => {
                    record.hostname = value.as_str().map(str::to_string);
                    record.hostname.clone().map(Value::String)
                }
                _ => {
                    record.fields.insert(key, value);
                    continue;
                }
            };
            if typed.as_ref() != Some(&value) {
                record.verbatim.insert(key, value);
            }
        }
        record
    }
}

fn severity_from_json(value: &Value) -> Option<Severity> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|c| u32::try_from(c).ok()).map(Severity::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn time_from_json(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    }
}

impl Serialize for LogRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match self.verbatim.get("level") {
            Some(raw) => map.serialize_entry("level", raw)?,
            None => map.serialize_entry("level", &self.level)?,
        }
        match (self.verbatim.get("time"), &self.time) {
            (Some(raw), _) => map.serialize_entry("time", raw)?,
            (None, Some(time)) => map.serialize_entry("time", &time.timestamp_millis())?,
            (None, None) => {}
        }
        match (self.verbatim.get("pid"), self.pid) {
            (Some(raw), _) => map.serialize_entry("pid", raw)?,
            (None, Some(pid)) => map.serialize_entry("pid", &pid)?,
            (None, None) => {}
        }
        match (self.verbatim.get("hostname"), &self.hostname) {
            (Some(raw), _) => map.serialize_entry("hostname", raw)?,
            (None, Some(hostname)) => map.serialize_entry("hostname", hostname)?,
            (None, None) => {}
        }
        for (key, value) in &self.fields {
            if STANDARD_FIELDS.contains(&key.as_str()) {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        match (self.verbatim.get("msg"), &self.msg) {
            (Some(raw), _) => map.serialize_entry("msg", raw)?,
            (None, Some(msg)) => map.serialize_entry("msg", msg)?,
            (None, None) => {}
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LogRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(LogRecord::from_json_map)
    }
}
