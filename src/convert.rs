//! Late-bound scalar conversion: record values stay as loose JSON until a
//! caller asks for a concrete type (count cells, page bounds, flag columns).

use serde_json::Value;

/// Coerce to i64: numbers, numeric strings, booleans (true = 1).
pub fn to_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Coerce to f64: numbers and numeric strings.
pub fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerce to bool: booleans, nonzero numbers, and the usual string forms
/// ("true", "yes", "on", "1"; case-insensitive).
pub fn to_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0).or_else(|| n.as_f64().map(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// First cell of a row, coerced to i64. Count queries come back as a single
/// column whose name depends on the driver, so position is the only handle.
pub fn first_cell_i64(record: &crate::record::Record) -> Option<i64> {
    record.fields().next().and_then(|(_, v)| to_i64(v))
}

/// Textual form of a scalar; null becomes the empty string and strings lose
/// their JSON quoting.
pub fn to_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
