//! Resource identity

use crate::error::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Group, version, kind, namespace and name of one resource.
///
/// `group` is empty for the core API group. `namespace` is `None` for
/// cluster-scoped resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// API group, e.g. `apps`
    pub group: String,
    /// API version within the group, e.g. `v1`
    pub version: String,
    pub kind: String,
    /// Namespace of a namespaced resource
    pub namespace: Option<String>,
    /// `metadata.name`
    pub name: String,
}

impl ResourceIdentity {
    /// Parse the identity out of a manifest's `apiVersion`, `kind` and
    /// `metadata`.
    pub fn from_manifest(manifest: &Value) -> Result<Self, ManifestError> {
        let api_version = required_str(manifest, "/apiVersion")?;
        let kind = required_str(manifest, "/kind")?;
        let name = required_str(manifest, "/metadata/name")?;
        let namespace = manifest
            .pointer("/metadata/namespace")
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);

        let (group, version) = split_api_version(api_version);

        Ok(Self {
            group,
            version,
            kind: kind.to_string(),
            namespace,
            name: name.to_string(),
        })
    }

    /// `group/version`, or just `version` for the core group
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Split `group/version` into its parts; a bare version is the core group
pub(crate) fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

fn required_str<'a>(manifest: &'a Value, pointer: &str) -> Result<&'a str, ManifestError> {
    manifest
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ManifestError::InvalidManifest(format!(
                "{} is required",
                pointer.trim_start_matches('/').replace('/', ".")
            ))
        })
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={} ", self.api_version(), self.kind)?;
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_manifest() {
        let manifest = json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "web", "namespace": "qual" }
        });
        let id = ResourceIdentity::from_manifest(&manifest).unwrap();
        assert_eq!(id.group, "apps");
        assert_eq!(id.version, "v1");
        assert_eq!(id.kind, "Deployment");
        assert_eq!(id.namespace.as_deref(), Some("qual"));
        assert_eq!(id.name, "web");
        assert_eq!(id.to_string(), "apps/v1, Kind=Deployment qual/web");
    }

    #[test]
    fn test_core_group_and_cluster_scope() {
        let manifest = json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": "qual" }
        });
        let id = ResourceIdentity::from_manifest(&manifest).unwrap();
        assert_eq!(id.group, "");
        assert_eq!(id.api_version(), "v1");
        assert_eq!(id.namespace, None);
        assert_eq!(id.to_string(), "v1, Kind=Namespace qual");
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(split_api_version("apps/v1"), ("apps".to_string(), "v1".to_string()));
        assert_eq!(split_api_version("v1"), (String::new(), "v1".to_string()));
    }

    #[test]
    fn test_missing_fields() {
        let manifest = json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": {} });
        let err = ResourceIdentity::from_manifest(&manifest).unwrap_err();
        assert_eq!(err.to_string(), "Invalid manifest: metadata.name is required");

        let manifest = json!({ "kind": "ConfigMap", "metadata": { "name": "c" } });
        assert!(matches!(
            ResourceIdentity::from_manifest(&manifest),
            Err(ManifestError::InvalidManifest(_))
        ));
    }
}
