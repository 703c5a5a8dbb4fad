//! apiextensions.k8s.io: CustomResourceDefinition

use crate::classifier::Snapshot;
use crate::conditions::ConditionStatus;
use crate::error::StatusError;
use crate::verdict::Verdict;

/// CustomResourceDefinition.
///
/// Conditions are scanned in order; the first decisive one wins.
pub fn crd_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    for c in snapshot.conditions() {
        if c.r#type == "NamesAccepted" && c.status == ConditionStatus::False {
            return Ok(Verdict::failed(c.message.clone()));
        }
        if c.r#type == "Established" {
            if c.status == ConditionStatus::False && c.reason != "Installing" {
                return Ok(Verdict::failed(c.message.clone()));
            }
            if c.status == ConditionStatus::True {
                return Ok(Verdict::ready("CRD established"));
            }
        }
    }
    Ok(Verdict::in_progress("installing"))
}
