//! Status conditions
//!
//! Decodes `status.conditions` into typed [`Condition`] records. Order is
//! preserved, and lookups return the first match, mirroring the
//! one-condition-per-type convention controllers follow.

use crate::error::StatusError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Status of a condition: `True`, `False` or `Unknown`.
///
/// Any unrecognized string decodes as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// Condition holds
    True,
    /// Condition does not hold
    False,
    /// Controller cannot tell
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        })
    }
}

/// One entry of `status.conditions`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. `Ready` or `Progressing`
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: String,

    /// Condition status
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ConditionStatus,

    /// Machine-readable reason for the last transition
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,

    /// Human-readable message
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode the conditions of a resource.
///
/// A resource without `status`, or whose status has no conditions, yields an
/// empty list. A status that is not an object, or conditions that do not fit
/// the schema, are errors.
pub fn extract_conditions(obj: &Value) -> Result<Vec<Condition>, StatusError> {
    let status = match obj.get("status") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(status) => status
            .as_object()
            .ok_or_else(|| StatusError::malformed("status", "object"))?,
    };

    match status.get("conditions") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(raw) => Vec::<Condition>::deserialize(raw).map_err(StatusError::MalformedConditions),
    }
}

/// Whether a condition with this type and status exists
#[must_use]
pub fn has_condition(conditions: &[Condition], condition_type: &str, status: ConditionStatus) -> bool {
    find_condition(conditions, condition_type, status).is_some()
}

/// First condition matching both type and status
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
    status: ConditionStatus,
) -> Option<&'a Condition> {
    conditions
        .iter()
        .find(|c| c.r#type == condition_type && c.status == status)
}
