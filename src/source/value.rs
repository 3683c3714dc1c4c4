//! Field extraction helpers for decoded JSON payloads.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// Parse a JSON number or numeric string as an exact decimal.
///
/// Numbers go through their textual form so `0.0001` stays `0.0001`
/// instead of passing through a binary float.
pub(crate) fn decimal(value: &Value) -> Result<Decimal, String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Null => return Err("value is null".to_string()),
        other => return Err(format!("expected a number, got {}", kind(other))),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| format!("'{text}' is not a number"))
}

/// Required decimal field of an object.
pub(crate) fn decimal_field(object: &Value, field: &str) -> Result<Decimal, String> {
    match object.get(field) {
        Some(value) => decimal(value).map_err(|reason| format!("{field}: {reason}")),
        None => Err(format!("missing field {field}")),
    }
}

/// Optional decimal field: absent or null is `None`, garbage is an error.
pub(crate) fn optional_decimal_field(object: &Value, field: &str) -> Result<Option<Decimal>, String> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decimal(value)
            .map(Some)
            .map_err(|reason| format!("{field}: {reason}")),
    }
}

/// Required string field of an object.
pub(crate) fn str_field<'a>(object: &'a Value, field: &str) -> Result<&'a str, String> {
    match object.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(Value::String(_)) => Err(format!("{field} is empty")),
        Some(other) => Err(format!("{field}: expected a string, got {}", kind(other))),
        None => Err(format!("missing field {field}")),
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
