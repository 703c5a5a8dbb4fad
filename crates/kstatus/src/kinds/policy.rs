//! Policy group: PodDisruptionBudget

use crate::classifier::Snapshot;
use crate::error::StatusError;
use crate::verdict::Verdict;

/// PodDisruptionBudget.
///
/// The disruption controller sets no conditions. Reaching this rule means
/// the generic generation check passed, so the controller has observed the
/// latest spec and computed the allowed disruptions.
pub fn pdb_conditions(_snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    Ok(Verdict::ready("AllowedDisruptions has been computed."))
}
