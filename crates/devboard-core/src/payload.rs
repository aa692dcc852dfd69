//! Defensive accessors for untrusted daemon payloads
//!
//! Daemon responses are loosely shaped: fields go missing, are renamed
//! between `camelCase` and `snake_case`, or arrive as strings where numbers
//! are expected. Snapshot types normalize a payload once, right after a
//! successful call, through [`PayloadExt`]. Every accessor takes a list of
//! accepted key aliases and falls back instead of failing.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// Epoch values below this are treated as seconds rather than milliseconds.
const EPOCH_SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Tolerant field access over a [`serde_json::Value`].
pub trait PayloadExt {
    /// First non-null value found under any of `keys`.
    fn field(&self, keys: &[&str]) -> Option<&Value>;

    /// String value; numbers and booleans are stringified.
    fn str_field(&self, keys: &[&str]) -> Option<String> {
        match self.field(keys)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn string_or(&self, keys: &[&str], default: &str) -> String {
        self.str_field(keys).unwrap_or_else(|| default.to_string())
    }

    /// Non-negative integer; accepts floats (truncated) and numeric strings.
    fn u64_field(&self, keys: &[&str]) -> Option<u64> {
        match self.field(keys)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64),
            _ => None,
        }
    }

    fn u64_or(&self, keys: &[&str], default: u64) -> u64 {
        self.u64_field(keys).unwrap_or(default)
    }

    /// Boolean; accepts `"true"`/`"false"` strings and `0`/`1` numbers.
    fn bool_field(&self, keys: &[&str]) -> Option<bool> {
        match self.field(keys)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|i| i != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn bool_or(&self, keys: &[&str], default: bool) -> bool {
        self.bool_field(keys).unwrap_or(default)
    }

    /// Array under any of `keys`; empty when absent or not an array.
    fn list(&self, keys: &[&str]) -> &[Value] {
        match self.field(keys) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    /// Object under any of `keys`.
    fn object_field(&self, keys: &[&str]) -> Option<&Map<String, Value>> {
        self.field(keys).and_then(Value::as_object)
    }

    /// Timestamp given as epoch milliseconds, epoch seconds, or RFC 3339.
    fn timestamp_field(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        match self.field(keys)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(epoch_to_datetime),
            Value::String(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

impl PayloadExt for Value {
    fn field(&self, keys: &[&str]) -> Option<&Value> {
        let obj = self.as_object()?;
        keys.iter()
            .filter_map(|key| obj.get(*key))
            .find(|v| !v.is_null())
    }
}

impl PayloadExt for Map<String, Value> {
    fn field(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.get(*key))
            .find(|v| !v.is_null())
    }
}

/// Items of a list payload that may arrive bare or wrapped in an object.
///
/// `[{..}]` and `{"jobs": [{..}]}` both yield the inner items.
pub fn list_payload<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    match value {
        Value::Array(items) => items.as_slice(),
        other => other.list(keys),
    }
}

fn epoch_to_datetime(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 {
        return None;
    }
    if raw < EPOCH_SECONDS_CUTOFF {
        Utc.timestamp_opt(raw, 0).single()
    } else {
        Utc.timestamp_millis_opt(raw).single()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    trimmed.parse::<i64>().ok().and_then(epoch_to_datetime)
}
