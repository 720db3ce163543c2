//! Record flattening and dotted-key lookup.
//!
//! A data frame carries flat key/value text pairs. Nested records are
//! flattened into dotted paths (`{"b": {"c": 2}}` becomes `b.c`), and each
//! path is resolved back against the record to produce its value text.
//!
//! # Example
//!
//! ```
//! use lumberjack_client::codec::{flatten, resolve};
//! use serde_json::json;
//!
//! let record = json!({"a": 1, "b": {"c": 2}});
//! let record = record.as_object().unwrap();
//!
//! assert_eq!(flatten(record), vec!["a", "b.c"]);
//! assert_eq!(resolve(record, "b.c").as_deref(), Some("2"));
//! assert_eq!(resolve(record, "b.d"), None);
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LumberjackError, Result};

/// One log event. Keys iterate in insertion order.
pub type Record = Map<String, Value>;

/// Convert any serializable value into a [`Record`].
///
/// # Errors
///
/// Returns [`LumberjackError::InvalidConfig`] if the value does not
/// serialize to a JSON object, or a JSON error if serialization fails.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(LumberjackError::InvalidConfig(format!(
            "record must serialize to an object, got {}",
            kind(&other)
        ))),
    }
}

/// Depth-first list of dotted keys for every scalar leaf.
///
/// Arrays and nulls are skipped. Order follows the record's iteration order.
pub fn flatten(record: &Record) -> Vec<String> {
    let mut keys = Vec::new();
    flatten_into(record, "", &mut keys);
    keys
}

fn flatten_into(record: &Record, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in record {
        match value {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                keys.push(format!("{prefix}{key}"));
            }
            Value::Object(nested) => {
                flatten_into(nested, &format!("{prefix}{key}."), keys);
            }
            Value::Array(_) | Value::Null => {}
        }
    }
}

/// Look up a dotted key and stringify what it points at.
///
/// Splits on the first `.` and descends. Returns `None` when any segment is
/// missing or an intermediate value is not a record.
pub fn resolve(record: &Record, key: &str) -> Option<String> {
    match key.split_once('.') {
        None => record.get(key).map(stringify),
        Some((head, rest)) => match record.get(head)? {
            Value::Object(nested) => resolve(nested, rest),
            _ => None,
        },
    }
}

/// Stringify a whole record as compact JSON.
pub fn stringify_record(record: &Record) -> String {
    // Map<String, Value> always serializes.
    serde_json::to_string(record).unwrap_or_default()
}

/// Text form of a single value on the wire.
///
/// Booleans become `1`/`0`, strings are written without quotes, numbers in
/// their shortest display form (`2.0` is sent as `2`), anything else as
/// compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
