//! Manifest client errors

use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur when reading or mutating a resource
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Manifest is missing apiVersion, kind or metadata.name
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// API rejected the request
    #[error("Kubernetes API error: {0}")]
    Api(String),
}

impl ManifestError {
    /// Whether this error means the resource does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            ManifestError::NotFound(_) => true,
            ManifestError::Kube(KubeError::Api(response)) => response.code == 404,
            _ => false,
        }
    }
}
