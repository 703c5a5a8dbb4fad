//! Core group: Service, Pod, PersistentVolumeClaim

use crate::classifier::Snapshot;
use crate::conditions::{ConditionStatus, find_condition, has_condition};
use crate::error::StatusError;
use crate::fields::nested_field;
use crate::verdict::Verdict;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

/// How long a pod may stay unschedulable before it is reported as failed
pub const SCHEDULE_WINDOW_SECONDS: i64 = 15;

/// Service. Only a `LoadBalancer` without a cluster IP is still converging.
pub fn service_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    let spec_type = snapshot.string(".spec.type", "ClusterIP");
    let cluster_ip = snapshot.string(".spec.clusterIP", "");

    if spec_type == "LoadBalancer" && cluster_ip.is_empty() {
        return Ok(Verdict::in_progress(
            "ClusterIP not set. Service type: LoadBalancer",
        ));
    }

    Ok(Verdict::ready("service ready"))
}

/// PersistentVolumeClaim. Ready once bound.
pub fn pvc_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    let phase = snapshot.string(".status.phase", "unknown");
    if phase != "Bound" {
        return Ok(Verdict::in_progress(format!(
            "PVC is not Bound. phase: {phase}"
        )));
    }
    Ok(Verdict::ready("PVC is bound"))
}

/// Pod, by phase.
pub fn pod_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    let phase = snapshot.string(".status.phase", "");

    match phase.as_str() {
        "Succeeded" => Ok(Verdict::ready("Pod completed")),
        "Failed" => Ok(Verdict::failed("Pod failed")),
        "Running" => {
            if has_condition(snapshot.conditions(), "Ready", ConditionStatus::True) {
                return Ok(Verdict::ready("Pod ready"));
            }

            let crash_looping = crash_looping_containers(snapshot.object())?;
            if !crash_looping.is_empty() {
                return Ok(Verdict::failed(format!(
                    "Containers in CrashLoop state: {}",
                    crash_looping.join(",")
                )));
            }

            Ok(Verdict::in_progress("Pod is running but is not Ready"))
        }
        "Pending" => {
            let unschedulable = find_condition(snapshot.conditions(), "PodScheduled", ConditionStatus::False)
                .is_some_and(|c| c.reason == "Unschedulable");
            if !unschedulable {
                return Ok(Verdict::in_progress("Pod is in the Pending phase"));
            }

            if within_schedule_window(snapshot.object(), snapshot.now()) {
                Ok(Verdict::in_progress("Pod has not been scheduled"))
            } else {
                Ok(Verdict::failed("Pod could not be scheduled"))
            }
        }
        // Not yet observed by the kubelet
        "" => Ok(Verdict::in_progress("Pod phase not available")),
        other => Err(StatusError::UnknownPodPhase(other.to_string())),
    }
}

/// Whether `now` is less than the schedule window past creation.
///
/// A missing or unparseable creation timestamp counts as long ago.
fn within_schedule_window(obj: &Value, now: DateTime<Utc>) -> bool {
    let created = nested_field(obj, &["metadata", "creationTimestamp"])
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));

    created.is_some_and(|created| now - TimeDelta::seconds(SCHEDULE_WINDOW_SECONDS) < created)
}

/// Names of containers waiting with reason `CrashLoopBackOff`.
fn crash_looping_containers(obj: &Value) -> Result<Vec<String>, StatusError> {
    let statuses = match nested_field(obj, &["status", "containerStatuses"]) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(statuses) => statuses
            .as_array()
            .ok_or_else(|| StatusError::malformed("status.containerStatuses", "array"))?,
    };

    let mut names = Vec::new();
    for status in statuses {
        let status = status
            .as_object()
            .ok_or_else(|| StatusError::malformed("status.containerStatuses[]", "object"))?;
        let Some(name) = status.get("name") else {
            continue;
        };
        let name = name
            .as_str()
            .ok_or_else(|| StatusError::malformed("status.containerStatuses[].name", "string"))?;

        let reason = status
            .get("state")
            .and_then(|state| state.get("waiting"))
            .and_then(|waiting| waiting.get("reason"))
            .and_then(Value::as_str);
        if reason == Some("CrashLoopBackOff") {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::test_support::{run, run_at};
    use crate::verdict::Reason;
    use serde_json::json;

    #[test]
    fn test_service() {
        let obj = json!({ "kind": "Service", "spec": { "type": "LoadBalancer" } });
        assert_eq!(run(service_conditions, &obj).unwrap().reason(), Reason::InProgress);

        let obj = json!({ "kind": "Service", "spec": { "type": "LoadBalancer", "clusterIP": "10.0.0.7" } });
        assert_eq!(run(service_conditions, &obj).unwrap(), Verdict::ready("service ready"));

        let obj = json!({ "kind": "Service", "spec": {} });
        assert_eq!(run(service_conditions, &obj).unwrap(), Verdict::ready("service ready"));
    }

    #[test]
    fn test_pvc() {
        let obj = json!({ "kind": "PersistentVolumeClaim", "status": { "phase": "Pending" } });
        assert_eq!(
            run(pvc_conditions, &obj).unwrap(),
            Verdict::in_progress("PVC is not Bound. phase: Pending")
        );

        let obj = json!({ "kind": "PersistentVolumeClaim" });
        assert_eq!(
            run(pvc_conditions, &obj).unwrap(),
            Verdict::in_progress("PVC is not Bound. phase: unknown")
        );

        let obj = json!({ "kind": "PersistentVolumeClaim", "status": { "phase": "Bound" } });
        assert_eq!(run(pvc_conditions, &obj).unwrap(), Verdict::ready("PVC is bound"));
    }

    fn pod(status: Value) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "p", "creationTimestamp": "2024-03-29T00:58:41Z" },
            "status": status
        })
    }

    #[test]
    fn test_pod_terminal_phases() {
        assert_eq!(
            run(pod_conditions, &pod(json!({ "phase": "Succeeded" }))).unwrap(),
            Verdict::ready("Pod completed")
        );
        assert_eq!(
            run(pod_conditions, &pod(json!({ "phase": "Failed" }))).unwrap(),
            Verdict::failed("Pod failed")
        );
    }

    #[test]
    fn test_pod_running() {
        let ready = pod(json!({
            "phase": "Running",
            "conditions": [{ "type": "Ready", "status": "True" }]
        }));
        assert_eq!(run(pod_conditions, &ready).unwrap(), Verdict::ready("Pod ready"));

        let not_ready = pod(json!({
            "phase": "Running",
            "containerStatuses": [
                { "name": "app", "state": { "running": {} } }
            ]
        }));
        assert_eq!(
            run(pod_conditions, &not_ready).unwrap(),
            Verdict::in_progress("Pod is running but is not Ready")
        );
    }

    #[test]
    fn test_pod_crash_loop() {
        let obj = pod(json!({
            "phase": "Running",
            "containerStatuses": [
                { "name": "app", "state": { "waiting": { "reason": "CrashLoopBackOff" } } },
                { "name": "sidecar", "state": { "running": {} } },
                { "name": "init", "state": { "waiting": { "reason": "CrashLoopBackOff" } } },
                { "state": { "waiting": { "reason": "CrashLoopBackOff" } } }
            ]
        }));
        assert_eq!(
            run(pod_conditions, &obj).unwrap(),
            Verdict::failed("Containers in CrashLoop state: app,init")
        );
    }

    #[test]
    fn test_pod_malformed_container_statuses() {
        let obj = pod(json!({ "phase": "Running", "containerStatuses": { "app": {} } }));
        assert!(matches!(
            run(pod_conditions, &obj),
            Err(StatusError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_pod_pending_schedule_window() {
        let obj = pod(json!({
            "phase": "Pending",
            "conditions": [{ "type": "PodScheduled", "status": "False", "reason": "Unschedulable" }]
        }));
        let created = DateTime::parse_from_rfc3339("2024-03-29T00:58:41Z")
            .unwrap()
            .with_timezone(&Utc);

        let early = created + TimeDelta::seconds(5);
        assert_eq!(
            run_at(pod_conditions, &obj, early).unwrap(),
            Verdict::in_progress("Pod has not been scheduled")
        );

        let late = created + TimeDelta::seconds(SCHEDULE_WINDOW_SECONDS);
        assert_eq!(
            run_at(pod_conditions, &obj, late).unwrap(),
            Verdict::failed("Pod could not be scheduled")
        );
    }

    #[test]
    fn test_pod_pending_without_creation_timestamp_fails() {
        let obj = json!({
            "kind": "Pod",
            "status": {
                "phase": "Pending",
                "conditions": [{ "type": "PodScheduled", "status": "False", "reason": "Unschedulable" }]
            }
        });
        assert_eq!(run(pod_conditions, &obj).unwrap().reason(), Reason::Failed);
    }

    #[test]
    fn test_pod_pending_scheduled() {
        let obj = pod(json!({
            "phase": "Pending",
            "conditions": [{ "type": "PodScheduled", "status": "True" }]
        }));
        assert_eq!(
            run(pod_conditions, &obj).unwrap(),
            Verdict::in_progress("Pod is in the Pending phase")
        );
    }

    #[test]
    fn test_pod_missing_and_unknown_phase() {
        assert_eq!(
            run(pod_conditions, &pod(json!({}))).unwrap(),
            Verdict::in_progress("Pod phase not available")
        );
        assert!(matches!(
            run(pod_conditions, &pod(json!({ "phase": "Evicted" }))),
            Err(StatusError::UnknownPodPhase(ref phase)) if phase == "Evicted"
        ));
    }
}
