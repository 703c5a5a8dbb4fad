//! Readiness verdicts

use crate::conditions::ConditionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason attached to a verdict.
///
/// The reason alone decides the verdict's status: `Ready`, `NoStatusInfo`
/// and `UserManaged` are `True`, the rest are `False`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// The controller reports the resource as converged
    Ready,
    /// Deletion is in progress
    Terminating,
    /// The controller is still converging the resource
    InProgress,
    /// Nothing to watch for this kind; assumed converged
    NoStatusInfo,
    /// Rollout is driven by the user rather than the controller
    UserManaged,
    /// The controller reports a terminal failure
    Failed,
}

impl Reason {
    /// String form used in messages and logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Ready => "Ready",
            Reason::Terminating => "Terminating",
            Reason::InProgress => "InProgress",
            Reason::NoStatusInfo => "NoStatusInfo",
            Reason::UserManaged => "UserManaged",
            Reason::Failed => "Failed",
        }
    }

    /// Whether verdicts with this reason carry a `True` status
    #[must_use]
    pub fn is_true(self) -> bool {
        matches!(self, Reason::Ready | Reason::NoStatusInfo | Reason::UserManaged)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    reason: Reason,
    message: String,
}

impl Verdict {
    /// Converged, with a human-readable explanation
    pub fn ready(message: impl Into<String>) -> Self {
        Self::new(Reason::Ready, message)
    }

    /// Still converging
    pub fn in_progress(message: impl Into<String>) -> Self {
        Self::new(Reason::InProgress, message)
    }

    /// Terminal failure reported by the controller
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(Reason::Failed, message)
    }

    /// Deletion timestamp is set
    #[must_use]
    pub fn terminating() -> Self {
        Self::new(Reason::Terminating, "")
    }

    /// No rule applies to this resource
    #[must_use]
    pub fn no_status_info() -> Self {
        Self::new(Reason::NoStatusInfo, "")
    }

    /// Rollout is left to the user
    #[must_use]
    pub fn user_managed() -> Self {
        Self::new(Reason::UserManaged, "")
    }

    fn new(reason: Reason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// `True` or `False`, derived from the reason
    #[must_use]
    pub fn status(&self) -> ConditionStatus {
        if self.reason.is_true() {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }

    /// Reason code
    #[must_use]
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Human-readable message, possibly empty
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for `status() == True`
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.reason.is_true()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{} ({})", self.status(), self.reason)
        } else {
            write!(f, "{} ({}): {}", self.status(), self.reason, self.message)
        }
    }
}
