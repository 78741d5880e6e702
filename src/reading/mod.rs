use serde::{Deserialize, Serialize};
use std::fmt;

mod classify;
mod timestamp;

pub use classify::{classify, SensorCategory};
pub use timestamp::{format_timestamp, parse_timestamp};

/// Reading represents one timestamped (topic, value) observation as stored.
///
/// Readings are read-only snapshots of store rows and live for the duration
/// of a single request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Free-form sensor channel (e.g., "garden/temp1")
    pub topic: String,

    /// Value exactly as stored (numeric or text)
    pub value: ReadingValue,

    /// ISO 8601 or "YYYY-MM-DD HH:MM:SS"
    pub timestamp: String,
}

impl Reading {
    pub fn new(
        topic: impl Into<String>,
        value: impl Into<ReadingValue>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Sensor category derived from the topic.
    pub fn category(&self) -> SensorCategory {
        classify(&self.topic)
    }

    /// Parses the stored value as a float.
    pub fn numeric_value(&self) -> Result<f64, ReadingError> {
        self.value.as_f64().ok_or_else(|| ReadingError::MalformedReading {
            topic: self.topic.clone(),
            value: self.value.to_string(),
        })
    }
}

/// Stored value of a reading. The store column accepts both text and numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
}

impl ReadingValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReadingValue::Number(n) => Some(*n),
            ReadingValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingValue::Number(n) => write!(f, "{}", n),
            ReadingValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ReadingValue {
    fn from(n: f64) -> Self {
        ReadingValue::Number(n)
    }
}

impl From<&str> for ReadingValue {
    fn from(s: &str) -> Self {
        ReadingValue::Text(s.to_string())
    }
}

impl From<String> for ReadingValue {
    fn from(s: String) -> Self {
        ReadingValue::Text(s)
    }
}

/// Errors raised while interpreting a stored reading
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingError {
    MalformedReading { topic: String, value: String },
    MalformedTimestamp(String),
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingError::MalformedReading { topic, value } => {
                write!(f, "reading for '{}' is not numeric: '{}'", topic, value)
            }
            ReadingError::MalformedTimestamp(ts) => {
                write!(
                    f,
                    "unrecognized timestamp '{}': expected ISO 8601 or YYYY-MM-DD HH:MM:SS",
                    ts
                )
            }
        }
    }
}

impl std::error::Error for ReadingError {}
