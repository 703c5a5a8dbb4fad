//! Classifier facade
//!
//! Runs the generic rules, then the kind-specific rule registered for the
//! resource's group and kind. A kind with no rule is reported as
//! `NoStatusInfo`: nothing to watch, assume converged.

use crate::conditions::Condition;
use crate::error::StatusError;
use crate::fields::{get_int_field, get_string_field};
use crate::generic::{GenericOutcome, check_generic_properties};
use crate::registry::Registry;
use crate::verdict::Verdict;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::default);

/// Classify `obj` with the built-in registry at the current time.
pub fn compute(obj: &Value) -> Result<Verdict, StatusError> {
    DEFAULT_CLASSIFIER.classify(obj)
}

/// A resource as seen by a kind-specific rule.
///
/// Carries the raw tree, the conditions already decoded by the generic
/// stage, and the instant classification is evaluated at.
#[derive(Debug)]
pub struct Snapshot<'a> {
    object: &'a Value,
    conditions: Vec<Condition>,
    now: DateTime<Utc>,
}

impl<'a> Snapshot<'a> {
    /// Build a snapshot directly; normally done by [`Classifier`].
    #[must_use]
    pub fn new(object: &'a Value, conditions: Vec<Condition>, now: DateTime<Utc>) -> Self {
        Self {
            object,
            conditions,
            now,
        }
    }

    /// The raw resource tree
    #[must_use]
    pub fn object(&self) -> &'a Value {
        self.object
    }

    /// Decoded `status.conditions`, in order
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluation instant
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// `kind` of the resource, empty if unset
    #[must_use]
    pub fn kind(&self) -> String {
        get_string_field(self.object, "kind", "")
    }

    /// Integer at a dotted path, or `default`
    #[must_use]
    pub fn int(&self, path: &str, default: i64) -> i64 {
        get_int_field(self.object, path, default)
    }

    /// String at a dotted path, or `default`
    #[must_use]
    pub fn string(&self, path: &str, default: &str) -> String {
        get_string_field(self.object, path, default)
    }
}

/// Group and kind of a resource, from `apiVersion` and `kind`.
///
/// An `apiVersion` without a `/` belongs to the core group (`""`).
#[must_use]
pub fn group_kind(obj: &Value) -> (String, String) {
    let api_version = get_string_field(obj, "apiVersion", "");
    let group = api_version
        .split_once('/')
        .map(|(group, _)| group.to_string())
        .unwrap_or_default();
    (group, get_string_field(obj, "kind", ""))
}

/// Maps resource snapshots to verdicts.
///
/// Stateless apart from its registry, which is fixed at construction; safe
/// to share between tasks.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    registry: Registry,
}

impl Classifier {
    /// Classifier backed by a custom registry
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry consulted for kind-specific rules
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Classify `obj` at the current time.
    pub fn classify(&self, obj: &Value) -> Result<Verdict, StatusError> {
        self.classify_at(obj, Utc::now())
    }

    /// Classify `obj` as of `now`.
    ///
    /// Only time-dependent rules (the pod scheduling window) look at `now`.
    pub fn classify_at(&self, obj: &Value, now: DateTime<Utc>) -> Result<Verdict, StatusError> {
        let conditions = match check_generic_properties(obj)? {
            GenericOutcome::Concluded(verdict) => {
                trace!("Generic rules concluded: {}", verdict);
                return Ok(verdict);
            }
            GenericOutcome::Deferred(conditions) => conditions,
        };

        let (group, kind) = group_kind(obj);
        match self.registry.lookup(&group, &kind) {
            Some(classify_fn) => classify_fn(&Snapshot::new(obj, conditions, now)),
            None => {
                debug!("No status rule for {}, reporting NoStatusInfo", crate::registry_key(&group, &kind));
                Ok(Verdict::no_status_info())
            }
        }
    }
}
