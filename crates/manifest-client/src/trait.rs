//! ManifestClient trait for mocking
//!
//! The concrete `KubeManifestClient` implements this trait; the poller and
//! applier only see the trait, so tests can swap in `MockManifestClient`.

use crate::error::ManifestError;
use crate::identity::ResourceIdentity;
use serde_json::Value;

/// Trait for dynamic resource operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ManifestClientTrait: Send + Sync {
    /// Fetch the current state of a resource.
    ///
    /// A missing resource is an error for which
    /// [`ManifestError::is_not_found`] is true.
    async fn get(&self, identity: &ResourceIdentity) -> Result<Value, ManifestError>;

    /// List every resource of one kind.
    ///
    /// `api_version` is `group/version` (or a bare version for the core
    /// group). `namespace` narrows a namespaced kind to one namespace; `None`
    /// lists across all namespaces.
    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Value>, ManifestError>;

    /// Create the resource described by `manifest`
    async fn create(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError>;

    /// Replace the resource described by `manifest`
    async fn update(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError>;

    /// Delete a resource
    async fn delete(&self, identity: &ResourceIdentity, dry_run: bool) -> Result<(), ManifestError>;
}
