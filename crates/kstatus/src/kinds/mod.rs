//! Kind-specific rules
//!
//! One function per built-in kind, grouped by API group. Each encodes how
//! that kind's controller reports convergence.

pub mod apiextensions;
pub mod apps;
pub mod batch;
pub mod core;
pub mod policy;

use crate::classifier::Snapshot;
use crate::error::StatusError;
use crate::verdict::Verdict;

/// Kinds with no controller-side convergence (Secret, ConfigMap, CronJob)
pub fn always_ready(_snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    Ok(Verdict::ready("ready"))
}
