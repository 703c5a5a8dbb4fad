//! Unit tests for manifest operations

#[cfg(test)]
mod tests {
    use crate::applier::Applier;
    use crate::error::ControllerError;
    use crate::poller::{ConvergencePoller, PollFailure, RetryConfig};
    use crate::test_utils::*;
    use manifest_client::{ManifestClientTrait, MockGet, MockManifestClient};
    use serde_json::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn applier(client: &MockManifestClient) -> Applier {
        Applier::new(Arc::new(client.clone()), RetryConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_for_ready() {
        let client = MockManifestClient::new();
        let manifest = create_test_config_map("edge01", "default");

        let result = applier(&client)
            .create(&manifest, false, &CancellationToken::new())
            .await
            .unwrap();

        // Snapshot comes from the poll, which reads the stamped object back
        assert_eq!(result["metadata"]["resourceVersion"], "1");
        assert_eq!(client.get_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_dry_run_skips_polling() {
        let client = MockManifestClient::new();
        let manifest = create_test_config_map("edge01", "default");

        let result = applier(&client)
            .create(&manifest, true, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result, manifest);
        assert_eq!(client.get_calls(), 0);
        assert!(client.stored(&identity_of(&manifest)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_reports_terminal_failure() {
        let client = MockManifestClient::new();
        let job = create_test_failed_job("migrate", "default");

        let err = applier(&client)
            .create(&job, false, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ControllerError::ConvergenceFailed(PollFailure::Terminal { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_carries_resource_version() {
        let client = MockManifestClient::new();
        let original = create_test_config_map("edge01", "default");
        let current = client.create(&original, false).await.unwrap();

        let mut desired = original.clone();
        desired["data"]["clusterName"] = json!("edge11");

        let result = applier(&client)
            .update(&desired, Some(&current), false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result["data"]["clusterName"], "edge11");
        assert_eq!(result["metadata"]["resourceVersion"], "2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_with_stale_version_conflicts() {
        let client = MockManifestClient::new();
        let original = create_test_config_map("edge01", "default");
        client.create(&original, false).await.unwrap();

        let mut stale = original.clone();
        stale["metadata"]["resourceVersion"] = json!("41");

        let err = applier(&client)
            .update(&original, Some(&stale), false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Client(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_creates_then_updates() {
        let client = MockManifestClient::new();
        let applier = applier(&client);
        let manifest = create_test_deployment("web", "default", 2, 2);
        let cancel = CancellationToken::new();

        let created = applier.apply(&manifest, false, &cancel).await.unwrap();
        assert_eq!(created["metadata"]["resourceVersion"], "1");

        let updated = applier.apply(&manifest, false, &cancel).await.unwrap();
        assert_eq!(updated["metadata"]["resourceVersion"], "2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_propagates_read_errors() {
        let client = MockManifestClient::new();
        client.script_gets([MockGet::Error("forbidden".to_string())]);
        let manifest = create_test_config_map("edge01", "default");

        let err = applier(&client)
            .apply(&manifest, false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Client(_)));
        assert!(client.stored(&identity_of(&manifest)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_absent_is_success() {
        let client = MockManifestClient::new();
        let manifest = create_test_config_map("edge01", "default");

        applier(&client)
            .delete(&manifest, false, &CancellationToken::new())
            .await
            .unwrap();

        assert!(client.deleted().is_empty());
        assert_eq!(client.get_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_until_gone() {
        let client = MockManifestClient::new();
        let manifest = create_test_config_map("edge01", "default");
        client.add_object(manifest.clone()).unwrap();

        applier(&client)
            .delete(&manifest, false, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(client.deleted(), vec![identity_of(&manifest)]);
        // Existence check, then one poll that finds it gone
        assert_eq!(client.get_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_dry_run_keeps_object() {
        let client = MockManifestClient::new();
        let manifest = create_test_config_map("edge01", "default");
        client.add_object(manifest.clone()).unwrap();

        applier(&client)
            .delete(&manifest, true, &CancellationToken::new())
            .await
            .unwrap();

        assert!(client.stored(&identity_of(&manifest)).is_some());
        assert_eq!(client.get_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_wait_is_not_a_failure() {
        let client = MockManifestClient::new();
        let manifest = create_test_deployment("web", "default", 3, 0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = applier(&client)
            .create(&manifest, false, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Aborted(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_poller_uses_its_retry_config() {
        let client = MockManifestClient::new();
        let manifest = create_test_deployment("web", "default", 3, 1);
        let poller = ConvergencePoller::new(
            Arc::new(client.clone()),
            RetryConfig::default().with_max_retries(2),
        );

        let err = applier(&client)
            .with_poller(poller)
            .create(&manifest, false, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ControllerError::ConvergenceFailed(PollFailure::Exhausted { attempts: 2, .. })
        ));
        assert_eq!(client.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_read() {
        let client = MockManifestClient::new();
        let manifest = create_test_config_map("edge01", "default");
        client.add_object(manifest.clone()).unwrap();

        let current = applier(&client).read(&manifest).await.unwrap();
        assert_eq!(current, manifest);

        let missing = create_test_config_map("edge02", "default");
        let err = applier(&client).read(&missing).await.unwrap_err();
        assert!(matches!(err, ControllerError::Client(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_list_by_kind_and_namespace() {
        let client = MockManifestClient::new();
        client.add_object(create_test_config_map("edge01", "default")).unwrap();
        client.add_object(create_test_config_map("edge02", "qual")).unwrap();
        client.add_object(create_test_deployment("web", "default", 1, 1)).unwrap();

        // Name is not needed to list
        let query = json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "namespace": "default" } });
        let listed = applier(&client).list(&query).await.unwrap();
        assert_eq!(listed, vec![create_test_config_map("edge01", "default")]);

        let query = json!({ "apiVersion": "v1", "kind": "ConfigMap" });
        assert_eq!(applier(&client).list(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_requires_kind() {
        let client = MockManifestClient::new();
        let err = applier(&client)
            .list(&json!({ "apiVersion": "v1" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Client(_)));
    }
}
