//! Total accessors over loosely structured vendor JSON.
//!
//! Every accessor returns `Option<T>`: a missing key, `null` and a value of
//! the wrong shape are all `None`. Nothing here substitutes zero for an
//! absent field.

use crate::core::errors::ExchangeError;
use crate::core::precision::parse_decimal;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::value::Index;
use serde_json::Value;

/// Conversion from a JSON value into a typed field.
pub trait Extract: Sized {
    fn extract(value: &Value) -> Option<Self>;
}

impl Extract for String {
    fn extract(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl Extract for Decimal {
    fn extract(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => parse_decimal(s),
            // Display of a JSON number keeps the shortest round-trip form,
            // so 0.1 parses as exactly 0.1
            Value::Number(n) => parse_decimal(&n.to_string()),
            _ => None,
        }
    }
}

impl Extract for i64 {
    fn extract(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                let d = parse_decimal(&n.to_string())?;
                d.fract().is_zero().then(|| d.trunc().to_string().parse().ok())?
            }),
            Value::String(s) => s.trim().parse().ok().or_else(|| {
                let d = parse_decimal(s)?;
                d.fract().is_zero().then(|| d.trunc().to_string().parse().ok())?
            }),
            _ => None,
        }
    }
}

impl Extract for u32 {
    fn extract(value: &Value) -> Option<Self> {
        i64::extract(value).and_then(|v| Self::try_from(v).ok())
    }
}

impl Extract for bool {
    fn extract(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Extract for Value {
    fn extract(value: &Value) -> Option<Self> {
        (!value.is_null()).then(|| value.clone())
    }
}

/// Typed lookup of `key` (object key or array index).
pub fn get<T: Extract, I: Index>(record: &Value, key: I) -> Option<T> {
    record.get(key).filter(|v| !v.is_null()).and_then(T::extract)
}

pub fn get_or<T: Extract>(record: &Value, key: &str, default: T) -> T {
    get(record, key).unwrap_or(default)
}

/// First of two spellings of the same field.
pub fn get_either<T: Extract>(record: &Value, key1: &str, key2: &str) -> Option<T> {
    get(record, key1).or_else(|| get(record, key2))
}

/// First key in `keys` that yields a value.
pub fn get_any<T: Extract>(record: &Value, keys: &[&str]) -> Option<T> {
    keys.iter().find_map(|key| get(record, *key))
}

pub fn get_nested<T: Extract>(record: &Value, key: &str, subkey: &str) -> Option<T> {
    record.get(key).and_then(|inner| get(inner, subkey))
}

pub fn get_string(record: &Value, key: &str) -> Option<String> {
    get(record, key)
}

pub fn get_string_lower(record: &Value, key: &str) -> Option<String> {
    get_string(record, key).map(|s| s.to_lowercase())
}

pub fn get_string_upper(record: &Value, key: &str) -> Option<String> {
    get_string(record, key).map(|s| s.to_uppercase())
}

pub fn get_decimal(record: &Value, key: &str) -> Option<Decimal> {
    get(record, key)
}

pub fn get_int(record: &Value, key: &str) -> Option<i64> {
    get(record, key)
}

pub fn get_bool(record: &Value, key: &str) -> Option<bool> {
    get(record, key)
}

/// Timestamp in milliseconds from integer milliseconds or an ISO-8601 string.
pub fn get_timestamp(record: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(parse_timestamp))
}

pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => i64::extract(value),
        Value::String(s) => s.trim().parse::<i64>().ok().or_else(|| parse8601(s)),
        _ => None,
    }
}

/// Parse an ISO-8601 datetime; strings without an offset are taken as UTC.
pub fn parse8601(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}

pub fn iso8601(timestamp_ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// View a payload as a list, failing loudly when it is some other container.
pub fn as_list<'a>(exchange: &str, value: &'a Value) -> Result<&'a [Value], ExchangeError> {
    value.as_array().map(Vec::as_slice).ok_or_else(|| {
        ExchangeError::invalid_response(
            exchange,
            format!("expected a list, got {}", kind_of(value)),
        )
    })
}

pub const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
