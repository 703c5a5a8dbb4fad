//! Kind-specific rule registry
//!
//! Keys are `group/kind`, or the bare kind for the core API group.

use crate::classifier::Snapshot;
use crate::error::StatusError;
use crate::kinds;
use crate::verdict::Verdict;
use std::collections::HashMap;

/// Signature of a kind-specific rule
pub type ClassifyFn = fn(&Snapshot<'_>) -> Result<Verdict, StatusError>;

/// Registry key for a group and kind
#[must_use]
pub fn registry_key(group: &str, kind: &str) -> String {
    if group.is_empty() {
        kind.to_string()
    } else {
        format!("{group}/{kind}")
    }
}

/// Mapping from group/kind to the rule that classifies it.
///
/// Populated once, before the registry is handed to a classifier.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashMap<String, ClassifyFn>,
}

impl Registry {
    /// Registry with no rules; every kind reports `NoStatusInfo`
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Rules for the built-in Kubernetes kinds
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with("Service", kinds::core::service_conditions)
            .with("Pod", kinds::core::pod_conditions)
            .with("Secret", kinds::always_ready)
            .with("PersistentVolumeClaim", kinds::core::pvc_conditions)
            .with("ConfigMap", kinds::always_ready)
            .with("apps/StatefulSet", kinds::apps::sts_conditions)
            .with("apps/DaemonSet", kinds::apps::daemonset_conditions)
            .with("extensions/DaemonSet", kinds::apps::daemonset_conditions)
            .with("apps/Deployment", kinds::apps::deployment_conditions)
            .with("extensions/Deployment", kinds::apps::deployment_conditions)
            .with("apps/ReplicaSet", kinds::apps::replicaset_conditions)
            .with("extensions/ReplicaSet", kinds::apps::replicaset_conditions)
            .with("policy/PodDisruptionBudget", kinds::policy::pdb_conditions)
            .with("batch/CronJob", kinds::always_ready)
            .with("batch/Job", kinds::batch::job_conditions)
            .with(
                "apiextensions.k8s.io/CustomResourceDefinition",
                kinds::apiextensions::crd_conditions,
            )
    }

    /// Add or replace the rule for `key`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, classify_fn: ClassifyFn) -> Self {
        self.entries.insert(key.into(), classify_fn);
        self
    }

    /// Rule for a group and kind, if one is registered
    #[must_use]
    pub fn lookup(&self, group: &str, kind: &str) -> Option<ClassifyFn> {
        self.entries.get(&registry_key(group, kind)).copied()
    }

    /// Number of registered rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no rules are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_key() {
        assert_eq!(registry_key("", "Pod"), "Pod");
        assert_eq!(registry_key("apps", "Deployment"), "apps/Deployment");
    }

    #[test]
    fn test_builtin_covers_legacy_groups() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 16);
        for (group, kind) in [
            ("apps", "DaemonSet"),
            ("extensions", "DaemonSet"),
            ("apps", "Deployment"),
            ("extensions", "Deployment"),
            ("apps", "ReplicaSet"),
            ("extensions", "ReplicaSet"),
        ] {
            assert!(registry.lookup(group, kind).is_some(), "{group}/{kind}");
        }
    }

    #[test]
    fn test_group_must_match() {
        let registry = Registry::builtin();
        // Core group Deployment does not exist
        assert!(registry.lookup("", "Deployment").is_none());
        // StatefulSet was never served from extensions
        assert!(registry.lookup("extensions", "StatefulSet").is_none());
        assert!(registry.lookup("batch", "Job").is_some());
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::empty();
        assert!(registry.is_empty());
        assert!(registry.lookup("", "Pod").is_none());
    }
}
