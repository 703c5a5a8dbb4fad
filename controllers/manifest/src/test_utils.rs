//! Test utilities for poller and applier tests
//!
//! Fixtures are typed k8s-openapi objects serialized into the loosely-typed
//! trees the client hands around.

#[cfg(test)]
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentSpec, DeploymentStatus};
#[cfg(test)]
use k8s_openapi::api::batch::v1::{Job, JobCondition, JobStatus};
#[cfg(test)]
use k8s_openapi::api::core::v1::ConfigMap;
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use manifest_client::ResourceIdentity;
#[cfg(test)]
use serde_json::Value;
#[cfg(test)]
use std::collections::BTreeMap;

#[cfg(test)]
fn to_value<T: serde::Serialize>(resource: &T) -> Value {
    serde_json::to_value(resource).expect("fixture must serialize")
}

#[cfg(test)]
fn test_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Helper to create a test ConfigMap manifest
#[cfg(test)]
pub fn create_test_config_map(name: &str, namespace: &str) -> Value {
    to_value(&ConfigMap {
        metadata: test_meta(name, namespace),
        data: Some(BTreeMap::from([("clusterName".to_string(), "edge10".to_string())])),
        ..Default::default()
    })
}

/// Helper to create a test Deployment with `ready` of `replicas` replicas
/// rolled out
#[cfg(test)]
pub fn create_test_deployment(name: &str, namespace: &str, replicas: i32, ready: i32) -> Value {
    let condition = |type_: &str, status: &str, reason: &str| DeploymentCondition {
        type_: type_.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        ..Default::default()
    };
    let rolled_out = ready >= replicas;

    to_value(&Deployment {
        metadata: ObjectMeta {
            generation: Some(1),
            ..test_meta(name, namespace)
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            observed_generation: Some(1),
            replicas: Some(replicas),
            updated_replicas: Some(replicas),
            ready_replicas: Some(ready),
            available_replicas: Some(ready),
            conditions: Some(vec![
                condition(
                    "Progressing",
                    "True",
                    if rolled_out { "NewReplicaSetAvailable" } else { "ReplicaSetUpdated" },
                ),
                condition(
                    "Available",
                    if rolled_out { "True" } else { "False" },
                    "MinimumReplicasAvailable",
                ),
            ]),
            ..Default::default()
        }),
    })
}

/// Helper to create a test Job that exceeded its backoff limit
#[cfg(test)]
pub fn create_test_failed_job(name: &str, namespace: &str) -> Value {
    to_value(&Job {
        metadata: test_meta(name, namespace),
        spec: None,
        status: Some(JobStatus {
            failed: Some(6),
            conditions: Some(vec![JobCondition {
                type_: "Failed".to_string(),
                status: "True".to_string(),
                reason: Some("BackoffLimitExceeded".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    })
}

/// A custom resource kind with no classification rule
#[cfg(test)]
pub fn create_test_widget(name: &str, namespace: &str) -> Value {
    serde_json::json!({
        "apiVersion": "example.com/v1",
        "kind": "Widget",
        "metadata": { "name": name, "namespace": namespace },
        "spec": { "size": 3 }
    })
}

/// Identity of a fixture
#[cfg(test)]
pub fn identity_of(manifest: &Value) -> ResourceIdentity {
    ResourceIdentity::from_manifest(manifest).expect("fixture must carry an identity")
}
