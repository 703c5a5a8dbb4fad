//! Manifest operations
//!
//! Each mutating operation sends one request and then, unless it is a dry
//! run, blocks on the convergence poller until the resource is ready (or
//! gone, for a delete).

use crate::error::ControllerError;
use crate::poller::{ConvergencePoller, RetryConfig};
use manifest_client::{ManifestClientTrait, ManifestError, ResourceIdentity};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Applies manifests and waits for them to converge
pub struct Applier {
    client: Arc<dyn ManifestClientTrait>,
    poller: ConvergencePoller,
}

impl Applier {
    /// Build an applier whose waits use the default classifier and `retry`
    pub fn new(client: Arc<dyn ManifestClientTrait>, retry: RetryConfig) -> Self {
        let poller = ConvergencePoller::new(Arc::clone(&client), retry);
        Self { client, poller }
    }

    /// Use a preconfigured poller (custom classifier)
    #[must_use]
    pub fn with_poller(mut self, poller: ConvergencePoller) -> Self {
        self.poller = poller;
        self
    }

    /// Current state of the resource the manifest describes
    pub async fn read(&self, manifest: &Value) -> Result<Value, ControllerError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        Ok(self.client.get(&identity).await?)
    }

    /// Every resource sharing the manifest's `apiVersion` and `kind`.
    ///
    /// Only those fields and `metadata.namespace` are read, so a manifest
    /// without a name is accepted. Without a namespace the listing spans
    /// the whole cluster.
    pub async fn list(&self, manifest: &Value) -> Result<Vec<Value>, ControllerError> {
        let field = |pointer| non_empty_str(manifest, pointer);
        let (Some(api_version), Some(kind)) = (field("/apiVersion"), field("/kind")) else {
            return Err(ManifestError::InvalidManifest(
                "apiVersion and kind are required to list".to_string(),
            )
            .into());
        };
        let namespace = field("/metadata/namespace");

        debug!("Listing {}, Kind={}", api_version, kind);
        Ok(self.client.list(api_version, kind, namespace).await?)
    }

    /// Create the resource and wait until it is ready.
    ///
    /// Returns the last snapshot read while polling, or the API response
    /// for a dry run.
    pub async fn create(
        &self,
        manifest: &Value,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Value, ControllerError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        info!("Creating {}", identity);
        let created = self.client.create(manifest, dry_run).await?;
        if dry_run {
            return Ok(created);
        }
        self.wait_ready(&identity, created, cancel).await
    }

    /// Replace the resource and wait until it is ready.
    ///
    /// `previous` is the object as last read; its `resourceVersion`, when
    /// set, is carried onto the new body so a concurrent change is rejected
    /// as a conflict instead of overwritten.
    pub async fn update(
        &self,
        manifest: &Value,
        previous: Option<&Value>,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Value, ControllerError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        let mut desired = manifest.clone();
        if let Some(version) = previous.and_then(resource_version) {
            set_resource_version(&mut desired, version);
        }

        info!("Updating {}", identity);
        let updated = self.client.update(&desired, dry_run).await?;
        if dry_run {
            return Ok(updated);
        }
        self.wait_ready(&identity, updated, cancel).await
    }

    /// Create the resource if it is absent, update it otherwise
    pub async fn apply(
        &self,
        manifest: &Value,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<Value, ControllerError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        match self.client.get(&identity).await {
            Ok(current) => self.update(manifest, Some(&current), dry_run, cancel).await,
            Err(e) if e.is_not_found() => self.create(manifest, dry_run, cancel).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the resource and wait until it is gone.
    ///
    /// A resource that is already absent counts as deleted.
    pub async fn delete(
        &self,
        manifest: &Value,
        dry_run: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        match self.client.get(&identity).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!("{} already absent", identity);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        info!("Deleting {}", identity);
        match self.client.delete(&identity, dry_run).await {
            Ok(()) => {}
            // Deleted by someone else in between
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        if dry_run {
            return Ok(());
        }

        self.poller
            .poll_until_converged(&identity, true, cancel)
            .await
            .into_result(&identity)?;
        Ok(())
    }

    async fn wait_ready(
        &self,
        identity: &ResourceIdentity,
        written: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ControllerError> {
        let snapshot = self
            .poller
            .poll_until_converged(identity, false, cancel)
            .await
            .into_result(identity)?;
        Ok(snapshot.unwrap_or(written))
    }
}

fn non_empty_str<'a>(object: &'a Value, pointer: &str) -> Option<&'a str> {
    object
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn resource_version(object: &Value) -> Option<&str> {
    non_empty_str(object, "/metadata/resourceVersion")
}

fn set_resource_version(object: &mut Value, version: &str) {
    if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
        metadata.insert("resourceVersion".to_string(), Value::String(version.to_string()));
    }
}
