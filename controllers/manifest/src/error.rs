//! Controller-specific error types.
//!
//! Wraps the classifier and client errors and adds the failures that only
//! exist at the level of a whole run: bad configuration, unreadable manifest
//! files, resources that never converged, and aborted waits.

use kstatus::StatusError;
use manifest_client::ManifestError;
use thiserror::Error;

use crate::poller::PollFailure;

/// Errors that can occur in the Manifest Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client error
    #[error("Manifest client error: {0}")]
    Client(#[from] ManifestError),

    /// Resource status could not be classified
    #[error("Status error: {0}")]
    Status(#[from] StatusError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Manifest file is not valid YAML
    #[error("Invalid manifest YAML: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Manifest file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource did not converge
    #[error("Convergence failed: {0}")]
    ConvergenceFailed(#[from] PollFailure),

    /// Wait was cancelled before the resource converged
    #[error("Aborted while waiting for {0}")]
    Aborted(String),
}
