use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric severity of a log record. Smaller is less severe.
///
/// The standard ladder runs from `TRACE` (10) to `FATAL` (60). Two extra
/// levels sit on it: `LOG`, an alias of `INFO`, and `NOTIFY`, which lands
/// between `WARN` and `ERROR` for messages that should stand out without
/// being errors. Codes outside the ladder are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Severity(u32);

impl Severity {
    pub const TRACE: Severity = Severity(10);
    pub const DEBUG: Severity = Severity(20);
    pub const INFO: Severity = Severity(30);
    pub const LOG: Severity = Severity(30);
    pub const WARN: Severity = Severity(40);
    pub const NOTIFY: Severity = Severity(45);
    pub const ERROR: Severity = Severity(50);
    pub const FATAL: Severity = Severity(60);

    pub const fn new(code: u32) -> Self {
        Severity(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    /// Name of the level, or `None` for codes off the ladder.
    pub fn label(self) -> Option<&'static str> {
        match self.0 {
            10 => Some("trace"),
            20 => Some("debug"),
            30 => Some("info"),
            40 => Some("warn"),
            45 => Some("notify"),
            50 => Some("error"),
            60 => Some("fatal"),
            _ => None,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::INFO
    }
}

impl From<u32> for Severity {
    fn from(code: u32) -> Self {
        Severity(code)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "level-{}", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Severity::TRACE),
            "debug" => Ok(Severity::DEBUG),
            "info" => Ok(Severity::INFO),
            "log" => Ok(Severity::LOG),
            "warn" | "warning" => Ok(Severity::WARN),
            "notify" => Ok(Severity::NOTIFY),
            "error" => Ok(Severity::ERROR),
            "fatal" => Ok(Severity::FATAL),
            other => other
                .parse::<u32>()
                .map(Severity)
                .map_err(|_| UnknownSeverity(s.to_string())),
        }
    }
}

/// Accepts either the numeric code or a level name.
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u32),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Ok(Severity(code)),
            Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
