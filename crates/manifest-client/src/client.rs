//! Kubernetes manifest client
//!
//! Resolves a manifest's group/version/kind to an API resource at runtime and
//! talks to it through `Api<DynamicObject>`, so any kind (including custom
//! resources) can be read and mutated.

use crate::error::ManifestError;
use crate::identity::{ResourceIdentity, split_api_version};
use crate::manifest_trait::ManifestClientTrait;
use kube::Client;
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, PostParams};
use serde_json::Value;
use tracing::debug;

/// Field manager recorded on objects this client writes
pub const DEFAULT_FIELD_MANAGER: &str = "manifest-controller";

/// Manifest client backed by a kube-rs `Client`
#[derive(Clone)]
pub struct KubeManifestClient {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeManifestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeManifestClient")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeManifestClient {
    /// Wrap an existing kube client
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }

    /// Build a client from the in-cluster config or the local kubeconfig
    pub async fn try_default() -> Result<Self, ManifestError> {
        Ok(Self::new(Client::try_default().await?))
    }

    /// Override the field manager name
    #[must_use]
    pub fn with_field_manager(mut self, field_manager: impl Into<String>) -> Self {
        self.field_manager = field_manager.into();
        self
    }

    fn api(&self, identity: &ResourceIdentity) -> Api<DynamicObject> {
        self.api_for(
            &identity.group,
            &identity.version,
            &identity.kind,
            identity.namespace.as_deref(),
        )
    }

    fn api_for(&self, group: &str, version: &str, kind: &str, namespace: Option<&str>) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(group, version, kind);
        let api_resource = ApiResource::from_gvk(&gvk);
        match namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &api_resource),
            None => Api::all_with(self.client.clone(), &api_resource),
        }
    }

    fn post_params(&self, dry_run: bool) -> PostParams {
        PostParams {
            dry_run,
            field_manager: Some(self.field_manager.clone()),
        }
    }

    /// Fetch the current state of a resource
    pub async fn get(&self, identity: &ResourceIdentity) -> Result<Value, ManifestError> {
        debug!("Fetching {}", identity);
        let object = self
            .api(identity)
            .get_opt(&identity.name)
            .await?
            .ok_or_else(|| ManifestError::NotFound(identity.to_string()))?;
        Ok(serde_json::to_value(object)?)
    }

    /// List every resource of one kind, optionally within one namespace
    pub async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Value>, ManifestError> {
        let (group, version) = split_api_version(api_version);
        debug!("Listing {}, Kind={} in {:?}", api_version, kind, namespace);
        let list = self
            .api_for(&group, &version, kind, namespace)
            .list(&ListParams::default())
            .await?;

        // Items come back without apiVersion/kind; restore them so each one
        // is a complete manifest the classifier can read
        list.items
            .into_iter()
            .map(|object| -> Result<Value, ManifestError> {
                let mut value = serde_json::to_value(object)?;
                if let Some(map) = value.as_object_mut() {
                    map.insert("apiVersion".to_string(), Value::String(api_version.to_string()));
                    map.insert("kind".to_string(), Value::String(kind.to_string()));
                }
                Ok(value)
            })
            .collect()
    }

    /// Create the resource described by `manifest`
    pub async fn create(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        let object: DynamicObject = serde_json::from_value(manifest.clone())?;
        debug!("Creating {} (dry run: {})", identity, dry_run);

        let created = self
            .api(&identity)
            .create(&self.post_params(dry_run), &object)
            .await
            .map_err(|e| map_not_found(&identity, e))?;
        Ok(serde_json::to_value(created)?)
    }

    /// Replace the resource described by `manifest`.
    ///
    /// The manifest should carry the current `metadata.resourceVersion`;
    /// the API server rejects a stale one with a conflict.
    pub async fn update(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        let object: DynamicObject = serde_json::from_value(manifest.clone())?;
        debug!("Updating {} (dry run: {})", identity, dry_run);

        let updated = self
            .api(&identity)
            .replace(&identity.name, &self.post_params(dry_run), &object)
            .await
            .map_err(|e| map_not_found(&identity, e))?;
        Ok(serde_json::to_value(updated)?)
    }

    /// Delete a resource
    pub async fn delete(&self, identity: &ResourceIdentity, dry_run: bool) -> Result<(), ManifestError> {
        debug!("Deleting {} (dry run: {})", identity, dry_run);
        let params = DeleteParams {
            dry_run,
            ..DeleteParams::default()
        };

        // Either the object (finalizers pending) or a Status; both mean accepted
        self.api(identity)
            .delete(&identity.name, &params)
            .await
            .map_err(|e| map_not_found(identity, e))?;
        Ok(())
    }
}

/// Turn a 404 from the API server into `ManifestError::NotFound`
fn map_not_found(identity: &ResourceIdentity, error: kube::Error) -> ManifestError {
    let error = ManifestError::Kube(error);
    if error.is_not_found() {
        ManifestError::NotFound(identity.to_string())
    } else {
        error
    }
}

#[async_trait::async_trait]
impl ManifestClientTrait for KubeManifestClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Value, ManifestError> {
        self.get(identity).await
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Value>, ManifestError> {
        self.list(api_version, kind, namespace).await
    }

    async fn create(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError> {
        self.create(manifest, dry_run).await
    }

    async fn update(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError> {
        self.update(manifest, dry_run).await
    }

    async fn delete(&self, identity: &ResourceIdentity, dry_run: bool) -> Result<(), ManifestError> {
        self.delete(identity, dry_run).await
    }
}
