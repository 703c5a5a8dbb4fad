//! Field lookups into a loosely-typed resource tree
//!
//! The `get_*_field` helpers never fail: a missing field, a wrongly-typed
//! value or a non-object on the way down all yield the caller's default.
//! The `nested_*` helpers are strict about type and are used where a rule
//! must tell "absent" apart from "malformed".

use crate::error::StatusError;
use serde_json::Value;

/// Split a dotted path, dropping a leading empty segment (`.spec.replicas`).
fn split_path(path: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = path.split('.').collect();
    if fields.first() == Some(&"") {
        fields.remove(0);
    }
    fields
}

/// Walk `fields` from `obj`; `None` if any step is missing or not an object.
#[must_use]
pub fn nested_field<'a>(obj: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .try_fold(obj, |current, field| current.as_object()?.get(*field))
}

/// Return the string at `path`, or `default`
#[must_use]
pub fn get_string_field(obj: &Value, path: &str, default: &str) -> String {
    nested_field(obj, &split_path(path))
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Return the integer at `path`, or `default`
///
/// Any integer representation that fits an `i64` is accepted; floats and
/// strings are not integers.
#[must_use]
pub fn get_int_field(obj: &Value, path: &str, default: i64) -> i64 {
    nested_field(obj, &split_path(path))
        .and_then(Value::as_i64)
        .unwrap_or(default)
}

/// Strict string lookup. `null` counts as absent.
pub fn nested_string<'a>(obj: &'a Value, fields: &[&str]) -> Result<Option<&'a str>, StatusError> {
    match nested_field(obj, fields) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(StatusError::malformed(fields.join("."), "string")),
    }
}

/// Strict integer lookup. `null` counts as absent.
pub fn nested_int64(obj: &Value, fields: &[&str]) -> Result<Option<i64>, StatusError> {
    match nested_field(obj, fields) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| StatusError::malformed(fields.join("."), "integer")),
    }
}
