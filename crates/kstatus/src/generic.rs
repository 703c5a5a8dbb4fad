//! Rules that apply to every resource kind
//!
//! Evaluated before any kind-specific rule. The first rule that produces a
//! verdict wins:
//!
//! 1. a non-empty `metadata.deletionTimestamp` means `Terminating`
//! 2. `metadata.generation` differing from `status.observedGeneration` means
//!    `InProgress` (skipped when either is absent)
//! 3. a `Ready` condition is projected as `Ready` or `InProgress`

use crate::conditions::{Condition, ConditionStatus, extract_conditions};
use crate::error::StatusError;
use crate::fields::{get_string_field, nested_int64, nested_string};
use crate::verdict::Verdict;
use serde_json::Value;

/// Standard condition type consulted for every kind
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Result of the generic stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericOutcome {
    /// A generic rule decided the verdict
    Concluded(Verdict),
    /// No generic rule applied; kind-specific rules get the decoded conditions
    Deferred(Vec<Condition>),
}

/// Run the generic rules against `obj`.
pub fn check_generic_properties(obj: &Value) -> Result<GenericOutcome, StatusError> {
    if let Some(verdict) = check_deletion(obj)? {
        return Ok(GenericOutcome::Concluded(verdict));
    }

    if let Some(verdict) = check_generation(obj)? {
        return Ok(GenericOutcome::Concluded(verdict));
    }

    let conditions = extract_conditions(obj)?;
    if let Some(cond) = conditions.iter().find(|c| c.r#type == CONDITION_TYPE_READY) {
        let verdict = if cond.status == ConditionStatus::True {
            Verdict::ready(cond.message.clone())
        } else {
            Verdict::in_progress(cond.message.clone())
        };
        return Ok(GenericOutcome::Concluded(verdict));
    }

    Ok(GenericOutcome::Deferred(conditions))
}

fn check_deletion(obj: &Value) -> Result<Option<Verdict>, StatusError> {
    let deletion_timestamp = nested_string(obj, &["metadata", "deletionTimestamp"])?;
    Ok(deletion_timestamp
        .filter(|ts| !ts.is_empty())
        .map(|_| Verdict::terminating()))
}

/// Compare `metadata.generation` with `status.observedGeneration`.
///
/// Lenient: if either field is missing the check is skipped.
pub fn check_generation(obj: &Value) -> Result<Option<Verdict>, StatusError> {
    let Some(generation) = nested_int64(obj, &["metadata", "generation"])? else {
        return Ok(None);
    };
    let Some(observed) = nested_int64(obj, &["status", "observedGeneration"])? else {
        return Ok(None);
    };

    if observed != generation {
        let kind = get_string_field(obj, "kind", "");
        return Ok(Some(Verdict::in_progress(format!(
            "{kind} generation is {generation}, but latest observed generation is {observed}"
        ))));
    }
    Ok(None)
}

/// Require both `metadata.generation` and `status.observedGeneration`.
///
/// Stricter variant for kinds whose controller always sets both once it has
/// acted on the resource; a missing field means it has not yet done so.
pub fn check_generation_set(obj: &Value) -> Result<Option<Verdict>, StatusError> {
    let kind = get_string_field(obj, "kind", "");

    if nested_int64(obj, &["metadata", "generation"])?.is_none() {
        return Ok(Some(Verdict::in_progress(format!(
            "{kind} metadata.generation not found"
        ))));
    }
    if nested_int64(obj, &["status", "observedGeneration"])?.is_none() {
        return Ok(Some(Verdict::in_progress(format!(
            "{kind} status.observedGeneration not found"
        ))));
    }
    Ok(None)
}
