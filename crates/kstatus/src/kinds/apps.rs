//! Workload controllers: StatefulSet, Deployment, ReplicaSet, DaemonSet

use crate::classifier::Snapshot;
use crate::conditions::ConditionStatus;
use crate::error::StatusError;
use crate::generic::check_generation_set;
use crate::verdict::Verdict;

/// StatefulSets with this update strategy are rolled out by the user
pub const ON_DELETE_UPDATE_STRATEGY: &str = "OnDelete";

/// Value the deployment controller treats as "no progress deadline"
pub const PROGRESS_DEADLINE_UNSET: i64 = i32::MAX as i64;

/// StatefulSet.
///
/// The StatefulSet controller never sets conditions, so everything is
/// derived from replica counts and revisions.
pub fn sts_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    if snapshot.string(".spec.updateStrategy.type", "") == ON_DELETE_UPDATE_STRATEGY {
        return Ok(Verdict::user_managed());
    }

    let spec_replicas = snapshot.int(".spec.replicas", 1);
    let ready_replicas = snapshot.int(".status.readyReplicas", 0);
    let current_replicas = snapshot.int(".status.currentReplicas", 0);
    let updated_replicas = snapshot.int(".status.updatedReplicas", 0);
    let status_replicas = snapshot.int(".status.replicas", 0);
    let partition = snapshot.int(".spec.updateStrategy.rollingUpdate.partition", -1);

    if spec_replicas > status_replicas {
        return Ok(Verdict::in_progress(format!(
            "Replicas: {status_replicas}/{spec_replicas}"
        )));
    }

    if spec_replicas > ready_replicas {
        return Ok(Verdict::in_progress(format!(
            "Ready: {ready_replicas}/{spec_replicas}"
        )));
    }

    if status_replicas > spec_replicas {
        return Ok(Verdict::in_progress(format!(
            "Pending termination: {}",
            status_replicas.saturating_sub(spec_replicas)
        )));
    }

    if partition != -1 {
        let expected = spec_replicas.saturating_sub(partition);
        if updated_replicas < expected {
            return Ok(Verdict::in_progress(format!(
                "updated: {updated_replicas}/{expected}"
            )));
        }
        return Ok(Verdict::ready(format!(
            "Partition rollout complete. updated: {updated_replicas}"
        )));
    }

    if spec_replicas > current_replicas {
        return Ok(Verdict::in_progress(format!(
            "current: {current_replicas}/{spec_replicas}"
        )));
    }

    let current_revision = snapshot.string(".status.currentRevision", "");
    let update_revision = snapshot.string(".status.updateRevision", "");
    if current_revision != update_revision {
        return Ok(Verdict::in_progress(
            "Waiting for updated revision to match current",
        ));
    }

    Ok(Verdict::ready(format!(
        "All replicas scheduled as expected. Replicas: {status_replicas}"
    )))
}

/// Deployment.
///
/// A `Progressing` condition with reason `ProgressDeadlineExceeded` is the
/// only terminal failure. Without `spec.progressDeadlineSeconds` the
/// controller never sets `Progressing`, so the deployment counts as
/// progressing from the start.
pub fn deployment_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    let progress_deadline = snapshot.int(".spec.progressDeadlineSeconds", PROGRESS_DEADLINE_UNSET);
    let mut progressing = progress_deadline == PROGRESS_DEADLINE_UNSET;
    let mut available = false;

    for c in snapshot.conditions() {
        match c.r#type.as_str() {
            "Progressing" => {
                if c.reason == "ProgressDeadlineExceeded" {
                    return Ok(Verdict::failed(c.message.clone()));
                }
                if c.status == ConditionStatus::True && c.reason == "NewReplicaSetAvailable" {
                    progressing = true;
                }
            }
            "Available" => {
                if c.status == ConditionStatus::True {
                    available = true;
                }
            }
            _ => {}
        }
    }

    // Controller defaults spec.replicas to 1
    let spec_replicas = snapshot.int(".spec.replicas", 1);
    let status_replicas = snapshot.int(".status.replicas", 0);
    let updated_replicas = snapshot.int(".status.updatedReplicas", 0);
    let ready_replicas = snapshot.int(".status.readyReplicas", 0);
    let available_replicas = snapshot.int(".status.availableReplicas", 0);

    if spec_replicas > status_replicas {
        return Ok(Verdict::in_progress(format!(
            "Replicas: {status_replicas}/{spec_replicas}"
        )));
    }

    if spec_replicas > updated_replicas {
        return Ok(Verdict::in_progress(format!(
            "Updated: {updated_replicas}/{spec_replicas}"
        )));
    }

    if status_replicas > spec_replicas {
        return Ok(Verdict::in_progress(format!(
            "Pending termination: {}",
            status_replicas.saturating_sub(spec_replicas)
        )));
    }

    if updated_replicas > available_replicas {
        return Ok(Verdict::in_progress(format!(
            "Available: {available_replicas}/{updated_replicas}"
        )));
    }

    if spec_replicas > ready_replicas {
        return Ok(Verdict::in_progress(format!(
            "Ready: {ready_replicas}/{spec_replicas}"
        )));
    }

    if !progressing {
        return Ok(Verdict::in_progress("ReplicaSet not Available"));
    }
    if !available {
        return Ok(Verdict::in_progress("Deployment not Available"));
    }

    Ok(Verdict::ready(format!(
        "Deployment is available. Replicas: {status_replicas}"
    )))
}

/// ReplicaSet
pub fn replicaset_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    if snapshot
        .conditions()
        .iter()
        .any(|c| c.r#type == "ReplicaFailure" && c.status == ConditionStatus::True)
    {
        return Ok(Verdict::in_progress("Replica Failure condition. Check Pods"));
    }

    let spec_replicas = snapshot.int(".spec.replicas", 1);
    let status_replicas = snapshot.int(".status.replicas", 0);
    let ready_replicas = snapshot.int(".status.readyReplicas", 0);
    let available_replicas = snapshot.int(".status.availableReplicas", 0);
    let labelled_replicas = snapshot.int(".status.fullyLabeledReplicas", 0);

    if spec_replicas > labelled_replicas {
        return Ok(Verdict::in_progress(format!(
            "Labelled: {labelled_replicas}/{spec_replicas}"
        )));
    }

    if spec_replicas > available_replicas {
        return Ok(Verdict::in_progress(format!(
            "Available: {available_replicas}/{spec_replicas}"
        )));
    }

    if spec_replicas > ready_replicas {
        return Ok(Verdict::in_progress(format!(
            "Ready: {ready_replicas}/{spec_replicas}"
        )));
    }

    if status_replicas > spec_replicas {
        return Ok(Verdict::in_progress(format!(
            "Pending termination: {}",
            status_replicas.saturating_sub(spec_replicas)
        )));
    }

    Ok(Verdict::ready(format!(
        "ReplicaSet is available. Replicas: {status_replicas}"
    )))
}

/// DaemonSet.
///
/// Unlike the generic rule, a missing generation or observed generation is
/// itself `InProgress`: the daemonset controller always sets both once it
/// has acted.
pub fn daemonset_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    if let Some(verdict) = check_generation_set(snapshot.object())? {
        return Ok(verdict);
    }

    let desired = snapshot.int(".status.desiredNumberScheduled", -1);
    let current = snapshot.int(".status.currentNumberScheduled", 0);
    let updated = snapshot.int(".status.updatedNumberScheduled", 0);
    let available = snapshot.int(".status.numberAvailable", 0);
    let ready = snapshot.int(".status.numberReady", 0);

    if desired == -1 {
        return Ok(Verdict::in_progress("Missing .status.desiredNumberScheduled"));
    }

    if desired > current {
        return Ok(Verdict::in_progress(format!("Current: {current}/{desired}")));
    }

    if desired > updated {
        return Ok(Verdict::in_progress(format!("Updated: {updated}/{desired}")));
    }

    if desired > available {
        return Ok(Verdict::in_progress(format!("Available: {available}/{desired}")));
    }

    if desired > ready {
        return Ok(Verdict::in_progress(format!("Ready: {ready}/{desired}")));
    }

    Ok(Verdict::ready(format!(
        "All replicas scheduled as expected. Replicas: {desired}"
    )))
}
