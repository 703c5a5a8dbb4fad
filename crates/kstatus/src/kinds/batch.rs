//! Batch group: Job

use crate::classifier::Snapshot;
use crate::conditions::ConditionStatus;
use crate::error::StatusError;
use crate::verdict::Verdict;

/// Job.
///
/// `InProgress` until a `Complete` or `Failed` condition turns `True`.
/// `spec.completions` defaults to `spec.parallelism`, which defaults to 1.
pub fn job_conditions(snapshot: &Snapshot<'_>) -> Result<Verdict, StatusError> {
    let parallelism = snapshot.int(".spec.parallelism", 1);
    let completions = snapshot.int(".spec.completions", parallelism);
    let succeeded = snapshot.int(".status.succeeded", 0);
    let active = snapshot.int(".status.active", 0);
    let failed = snapshot.int(".status.failed", 0);
    let start_time = snapshot.string(".status.startTime", "");

    for c in snapshot.conditions() {
        if c.status != ConditionStatus::True {
            continue;
        }
        match c.r#type.as_str() {
            "Complete" => {
                return Ok(Verdict::ready(format!(
                    "Job Completed. succeeded: {succeeded}/{completions}"
                )));
            }
            "Failed" => {
                return Ok(Verdict::failed(format!(
                    "Job Failed. failed: {failed}/{completions}"
                )));
            }
            _ => {}
        }
    }

    if start_time.is_empty() {
        return Ok(Verdict::in_progress("Job not started"));
    }
    Ok(Verdict::in_progress(format!(
        "Job in progress. success:{succeeded}, active: {active}, failed: {failed}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::test_support::run;
    use serde_json::{Value, json};

    fn job(spec: Value, status: Value) -> Value {
        json!({ "apiVersion": "batch/v1", "kind": "Job", "spec": spec, "status": status })
    }

    #[test]
    fn test_job_complete() {
        let obj = job(
            json!({ "completions": 3 }),
            json!({ "succeeded": 3, "conditions": [{ "type": "Complete", "status": "True" }] }),
        );
        assert_eq!(run(job_conditions, &obj).unwrap(), Verdict::ready("Job Completed. succeeded: 3/3"));
    }

    #[test]
    fn test_job_failed() {
        let obj = job(
            json!({ "parallelism": 2 }),
            json!({
                "failed": 6,
                "startTime": "2024-03-29T00:58:41Z",
                "conditions": [
                    { "type": "Complete", "status": "False" },
                    { "type": "Failed", "status": "True", "reason": "BackoffLimitExceeded" }
                ]
            }),
        );
        // completions falls back to parallelism
        assert_eq!(run(job_conditions, &obj).unwrap(), Verdict::failed("Job Failed. failed: 6/2"));
    }

    #[test]
    fn test_job_default_completions() {
        let obj = job(
            json!({}),
            json!({ "succeeded": 1, "conditions": [{ "type": "Complete", "status": "True" }] }),
        );
        assert_eq!(run(job_conditions, &obj).unwrap(), Verdict::ready("Job Completed. succeeded: 1/1"));
    }

    #[test]
    fn test_job_not_started() {
        let obj = job(json!({}), json!({}));
        assert_eq!(run(job_conditions, &obj).unwrap(), Verdict::in_progress("Job not started"));
    }

    #[test]
    fn test_job_running() {
        let obj = job(
            json!({ "completions": 5, "parallelism": 2 }),
            json!({ "startTime": "2024-03-29T00:58:41Z", "succeeded": 2, "active": 2, "failed": 1 }),
        );
        assert_eq!(
            run(job_conditions, &obj).unwrap(),
            Verdict::in_progress("Job in progress. success:2, active: 2, failed: 1")
        );
    }
}
