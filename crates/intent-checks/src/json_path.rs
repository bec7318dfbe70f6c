//! Path resolution over JSON payloads.
//!
//! Resolution is all-or-nothing: the first segment that does not match
//! yields a reason and no value.

use intent_meta::{JsonPath, PathSegment};
use serde_json::Value;

/// Walk `path` through `root`.
pub fn resolve<'v>(root: &'v Value, path: &JsonPath) -> Result<&'v Value, String> {
    path.segments()
        .iter()
        .try_fold(root, |current, segment| step(current, segment))
        .map_err(|reason| format!("path '{path}' unresolved: {reason}"))
}

fn step<'v>(current: &'v Value, segment: &PathSegment) -> Result<&'v Value, String> {
    match (segment, current) {
        (PathSegment::Key(key), Value::Object(map)) => map
            .get(key)
            .ok_or_else(|| format!("key '{key}' not found")),
        (PathSegment::Key(key), other) => Err(format!(
            "expected an object for key '{key}', found {}",
            type_name(other)
        )),
        (PathSegment::Index(index), Value::Array(items)) => items.get(*index).ok_or_else(|| {
            format!("index {index} out of range (length {})", items.len())
        }),
        (PathSegment::Index(index), other) => Err(format!(
            "expected an array for index {index}, found {}",
            type_name(other)
        )),
    }
}

/// JSON type name used in reasons.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
