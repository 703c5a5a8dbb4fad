//! Classification errors

use thiserror::Error;

/// Errors raised when a snapshot cannot be interpreted.
///
/// These are distinct from an `InProgress` verdict: they mean the status
/// shape is not what the rule for this kind expects.
#[derive(Debug, Error)]
pub enum StatusError {
    /// `status.conditions` could not be decoded into the condition schema
    #[error("cannot decode status.conditions: {0}")]
    MalformedConditions(#[source] serde_json::Error),

    /// A field consulted by a strict lookup has the wrong type
    #[error("cannot look up {path} from resource: expected {expected}")]
    MalformedField {
        /// Dotted path of the offending field
        path: String,
        /// Type the rule expected to find
        expected: &'static str,
    },

    /// Pod reports a phase no rule knows about
    #[error("unknown phase {0}")]
    UnknownPodPhase(String),
}

impl StatusError {
    pub(crate) fn malformed(path: impl Into<String>, expected: &'static str) -> Self {
        Self::MalformedField {
            path: path.into(),
            expected,
        }
    }
}
