//! Kubernetes Readiness Classification
//!
//! Maps a loosely-typed resource snapshot (as returned by a dynamic
//! Kubernetes client) to a normalized readiness verdict.
//!
//! # Example
//!
//! ```
//! use kstatus::{Classifier, Reason};
//! use serde_json::json;
//!
//! let config_map = json!({
//!     "apiVersion": "v1",
//!     "kind": "ConfigMap",
//!     "metadata": { "name": "edge01", "namespace": "default" },
//!     "data": { "clusterName": "edge10" }
//! });
//!
//! let verdict = Classifier::default().classify(&config_map)?;
//! assert_eq!(verdict.reason(), Reason::Ready);
//! assert_eq!(verdict.message(), "ready");
//! # Ok::<(), kstatus::StatusError>(())
//! ```
//!
//! # Rules
//!
//! Classification runs in two stages:
//!
//! - **Generic rules** apply to every kind: a set `deletionTimestamp` means
//!   `Terminating`, an unobserved `generation` means `InProgress`, and a
//!   `Ready` condition is projected directly.
//! - **Kind-specific rules** come from a [`Registry`] keyed by `group/kind`
//!   (or the bare kind for the core group). Kinds with no entry report
//!   `NoStatusInfo`, which is an optimistic `True`.

pub mod classifier;
pub mod conditions;
pub mod error;
pub mod fields;
pub mod generic;
pub mod kinds;
pub mod registry;
pub mod verdict;

pub use classifier::{Classifier, Snapshot, compute};
pub use conditions::{Condition, ConditionStatus, extract_conditions, find_condition, has_condition};
pub use error::StatusError;
pub use fields::{get_int_field, get_string_field};
pub use registry::{ClassifyFn, Registry, registry_key};
pub use verdict::{Reason, Verdict};
