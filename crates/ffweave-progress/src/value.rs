//! Field values and records of the `-progress` protocol.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("numeric pattern is valid"));

/// A single field value. Values that look like signed integers or decimals
/// become numbers; everything else (`N/A`, `00:00:01.000000`, `12kB`) is kept
/// as trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressValue {
    Number(f64),
    Text(String),
}

impl ProgressValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NUMERIC.is_match(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                return ProgressValue::Number(n);
            }
        }
        ProgressValue::Text(trimmed.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ProgressValue::Number(n) => Some(*n),
            ProgressValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ProgressValue::Text(s) => Some(s),
            ProgressValue::Number(_) => None,
        }
    }
}

impl fmt::Display for ProgressValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers print without a trailing `.0`.
            ProgressValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ProgressValue::Number(n) => write!(f, "{n}"),
            ProgressValue::Text(s) => f.write_str(s),
        }
    }
}

/// An ordered set of `key=value` fields. Later writes to a key replace the
/// value but keep the key's original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressRecord {
    fields: Vec<(String, ProgressValue)>,
}

impl ProgressRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ProgressValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ProgressValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgressValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Frames encoded so far.
    pub fn frame(&self) -> Option<u64> {
        self.number("frame").filter(|n| *n >= 0.0).map(|n| n as u64)
    }

    pub fn fps(&self) -> Option<f64> {
        self.number("fps")
    }

    /// Output media time in microseconds.
    pub fn out_time_us(&self) -> Option<i64> {
        self.number("out_time_us").map(|n| n as i64)
    }

    /// Output media time as ffmpeg formats it (`HH:MM:SS.micros`).
    pub fn out_time(&self) -> Option<String> {
        self.get("out_time").map(ToString::to_string)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ProgressValue::as_f64)
    }
}

impl Serialize for ProgressRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
