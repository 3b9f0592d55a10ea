//! # YAML Value Utilities
//!
//! Small helpers over `serde_yaml::Value` shared by expansion and tree building.

use crate::error::AppResult;
use serde_yaml::{Mapping, Value};

/// Parses YAML text into a raw value, keeping custom tags as `Value::Tagged`
/// and resolving `<<` merge keys.
pub(crate) fn parse_text(text: &str) -> AppResult<Value> {
    let mut value: Value = serde_yaml::from_str(text)?;
    value.apply_merge()?;
    Ok(value)
}

/// Textual form of a scalar. `null` renders empty; collections have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Mapping keys used as names (route keys, parameter names, status codes).
pub(crate) fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::Null => None,
        other => scalar_text(other),
    }
}

/// Coerces an entity value into a mapping.
///
/// Mappings pass through, `null` becomes an empty mapping and a scalar fills
/// the `shorthand` field. Sequences cannot be coerced.
pub(crate) fn coerce_mapping(value: Value, shorthand: &str) -> Option<Mapping> {
    match value {
        Value::Mapping(map) => Some(map),
        Value::Null => Some(Mapping::new()),
        scalar @ (Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            let mut map = Mapping::new();
            map.insert(Value::from(shorthand), scalar);
            Some(map)
        }
        Value::Sequence(_) | Value::Tagged(_) => None,
    }
}

/// Short description of a value's kind for error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
