//! Mock ManifestClient for unit testing
//!
//! Stores objects in memory keyed by identity. Reads can additionally be
//! scripted, which lets a test play back the states a resource passes
//! through while its controller converges it.

use crate::error::ManifestError;
use crate::identity::{ResourceIdentity, split_api_version};
use crate::manifest_trait::ManifestClientTrait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One scripted response to `get`
#[derive(Debug, Clone)]
pub enum MockGet {
    /// Return this object
    Object(Value),
    /// Report the resource as absent
    NotFound,
    /// Fail with an API error carrying this message
    Error(String),
}

/// Mock ManifestClient for testing
///
/// Scripted reads are consumed first; once the script runs out, reads fall
/// back to the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MockManifestClient {
    objects: Arc<Mutex<HashMap<ResourceIdentity, Value>>>,
    scripted_gets: Arc<Mutex<VecDeque<MockGet>>>,
    get_calls: Arc<Mutex<usize>>,
    deleted: Arc<Mutex<Vec<ResourceIdentity>>>,
    next_resource_version: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockManifestClient {
    /// Create an empty mock client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an object in the store (for test setup)
    pub fn add_object(&self, object: Value) -> Result<(), ManifestError> {
        let identity = ResourceIdentity::from_manifest(&object)?;
        lock(&self.objects).insert(identity, object);
        Ok(())
    }

    /// Current stored object, bypassing the script
    #[must_use]
    pub fn stored(&self, identity: &ResourceIdentity) -> Option<Value> {
        lock(&self.objects).get(identity).cloned()
    }

    /// Queue responses for upcoming `get` calls
    pub fn script_gets(&self, responses: impl IntoIterator<Item = MockGet>) {
        lock(&self.scripted_gets).extend(responses);
    }

    /// Number of `get` calls made so far
    #[must_use]
    pub fn get_calls(&self) -> usize {
        *lock(&self.get_calls)
    }

    /// Identities passed to `delete`, in order
    #[must_use]
    pub fn deleted(&self) -> Vec<ResourceIdentity> {
        lock(&self.deleted).clone()
    }

    /// Stamp a fresh resourceVersion on an object about to be stored
    fn stamp(&self, manifest: &Value) -> Value {
        let mut object = manifest.clone();
        let mut next = lock(&self.next_resource_version);
        *next += 1;
        if let Some(metadata) = object.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.insert("resourceVersion".to_string(), json!(next.to_string()));
        }
        object
    }
}

#[async_trait::async_trait]
impl ManifestClientTrait for MockManifestClient {
    async fn get(&self, identity: &ResourceIdentity) -> Result<Value, ManifestError> {
        *lock(&self.get_calls) += 1;

        let scripted = lock(&self.scripted_gets).pop_front();
        match scripted {
            Some(MockGet::Object(object)) => Ok(object),
            Some(MockGet::NotFound) => Err(ManifestError::NotFound(identity.to_string())),
            Some(MockGet::Error(message)) => Err(ManifestError::Api(message)),
            None => lock(&self.objects)
                .get(identity)
                .cloned()
                .ok_or_else(|| ManifestError::NotFound(identity.to_string())),
        }
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<Value>, ManifestError> {
        let (group, version) = split_api_version(api_version);
        let objects = lock(&self.objects);
        let mut matching: Vec<(&ResourceIdentity, &Value)> = objects
            .iter()
            .filter(|(id, _)| id.group == group && id.version == version && id.kind == kind)
            .filter(|(id, _)| namespace.is_none() || id.namespace.as_deref() == namespace)
            .collect();
        matching.sort_by(|(a, _), (b, _)| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        Ok(matching.into_iter().map(|(_, object)| object.clone()).collect())
    }

    async fn create(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        if lock(&self.objects).contains_key(&identity) {
            return Err(ManifestError::Api(format!("{identity} already exists")));
        }

        if dry_run {
            return Ok(manifest.clone());
        }
        let object = self.stamp(manifest);
        lock(&self.objects).insert(identity, object.clone());
        Ok(object)
    }

    async fn update(&self, manifest: &Value, dry_run: bool) -> Result<Value, ManifestError> {
        let identity = ResourceIdentity::from_manifest(manifest)?;
        let current_version = lock(&self.objects)
            .get(&identity)
            .ok_or_else(|| ManifestError::NotFound(identity.to_string()))?
            .pointer("/metadata/resourceVersion")
            .cloned();

        // Mirrors the API server's optimistic concurrency check
        if let Some(requested) = manifest.pointer("/metadata/resourceVersion") {
            if current_version.as_ref() != Some(requested) {
                return Err(ManifestError::Api(format!(
                    "conflict updating {identity}: resourceVersion {requested} is stale"
                )));
            }
        }

        if dry_run {
            return Ok(manifest.clone());
        }
        let object = self.stamp(manifest);
        lock(&self.objects).insert(identity, object.clone());
        Ok(object)
    }

    async fn delete(&self, identity: &ResourceIdentity, dry_run: bool) -> Result<(), ManifestError> {
        if !lock(&self.objects).contains_key(identity) {
            return Err(ManifestError::NotFound(identity.to_string()));
        }
        lock(&self.deleted).push(identity.clone());
        if !dry_run {
            lock(&self.objects).remove(identity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_map() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "edge01", "namespace": "default" },
            "data": { "clusterName": "edge10" }
        })
    }

    #[tokio::test]
    async fn test_scripted_gets_then_store() {
        let client = MockManifestClient::new();
        let id = ResourceIdentity::from_manifest(&config_map()).unwrap();
        client.add_object(config_map()).unwrap();
        client.script_gets([MockGet::NotFound, MockGet::Error("etcd timeout".to_string())]);

        assert!(client.get(&id).await.unwrap_err().is_not_found());
        assert!(matches!(client.get(&id).await, Err(ManifestError::Api(_))));
        assert_eq!(client.get(&id).await.unwrap(), config_map());
        assert_eq!(client.get_calls(), 3);
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let client = MockManifestClient::new();
        let created = client.create(&config_map(), false).await.unwrap();
        assert_eq!(created["metadata"]["resourceVersion"], "1");
        assert!(client.create(&config_map(), false).await.is_err());

        // Stale resourceVersion is rejected
        let mut stale = config_map();
        stale["metadata"]["resourceVersion"] = json!("0");
        assert!(client.update(&stale, false).await.is_err());

        let updated = client.update(&created, false).await.unwrap();
        assert_eq!(updated["metadata"]["resourceVersion"], "2");

        let id = ResourceIdentity::from_manifest(&config_map()).unwrap();
        client.delete(&id, false).await.unwrap();
        assert!(client.stored(&id).is_none());
        assert!(client.delete(&id, false).await.unwrap_err().is_not_found());
        assert_eq!(client.deleted(), vec![id]);
    }

    #[tokio::test]
    async fn test_list_filters_by_kind_and_namespace() {
        let client = MockManifestClient::new();
        client.add_object(config_map()).unwrap();
        let mut other = config_map();
        other["metadata"] = json!({ "name": "edge02", "namespace": "qual" });
        client.add_object(other).unwrap();
        client
            .add_object(json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": { "name": "edge01", "namespace": "default" }
            }))
            .unwrap();

        let all = client.list("v1", "ConfigMap", None).await.unwrap();
        let names: Vec<&str> = all.iter().filter_map(|o| o["metadata"]["name"].as_str()).collect();
        assert_eq!(names, vec!["edge01", "edge02"]);

        let qual = client.list("v1", "ConfigMap", Some("qual")).await.unwrap();
        assert_eq!(qual.len(), 1);
        assert_eq!(qual[0]["metadata"]["name"], "edge02");

        assert!(client.list("apps/v1", "ConfigMap", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_does_not_store() {
        let client = MockManifestClient::new();
        client.create(&config_map(), true).await.unwrap();
        let id = ResourceIdentity::from_manifest(&config_map()).unwrap();
        assert!(client.stored(&id).is_none());
    }
}
