//! Manifest Controller
//!
//! Applies the Kubernetes manifests in one YAML file and waits for each
//! resource to converge before moving on to the next:
//! - apply / create / update: mutate, then poll until the resource is ready
//! - delete: delete, then poll until the resource is gone
//! - read: print the current state and its readiness verdict
//! - list: print every resource of the document's kind with its verdict
//!
//! The run stops at the first document that fails or does not converge.

mod applier;
mod backoff;
mod config;
mod error;
mod poller;
mod test_utils;

#[cfg(test)]
mod applier_test;

use crate::applier::Applier;
use crate::config::{ControllerConfig, ManifestAction};
use crate::error::ControllerError;
use manifest_client::{KubeManifestClient, ResourceIdentity};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Manifest Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Manifest: {}", config.manifest_path.display());
    info!("  Action: {}", config.action);
    info!("  Dry run: {}", config.dry_run);
    info!(
        "  Wait: {} attempts, up to {:?} per resource",
        config.retry.max_retries,
        config.retry.total_budget()
    );
    info!("  Timeout: {:?}", config.timeout);

    let manifests = load_manifests(&config.manifest_path, config.action)?;
    info!("Loaded {} manifest(s)", manifests.len());

    let mut client = KubeManifestClient::try_default().await?;
    if let Some(field_manager) = &config.field_manager {
        client = client.with_field_manager(field_manager.clone());
    }
    let applier = Applier::new(Arc::new(client), config.retry.clone());

    let cancel = CancellationToken::new();
    spawn_deadline(cancel.clone(), config.timeout);

    let result = run(&applier, &config, &manifests, &cancel).await;
    cancel.cancel();
    if let Err(e) = &result {
        error!("Manifest Controller failed: {}", e);
    }
    result
}

/// Cancel `cancel` when `timeout` passes or on Ctrl-C, whichever comes first
fn spawn_deadline(cancel: CancellationToken, timeout: std::time::Duration) {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(timeout) => warn!("Timeout of {:?} reached, aborting", timeout),
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => warn!("Interrupted, aborting"),
                Err(e) => {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    tokio::time::sleep(timeout).await;
                    warn!("Timeout of {:?} reached, aborting", timeout);
                }
            },
        }
        cancel.cancel();
    });
}

/// Parse every non-empty document in a YAML file
fn load_manifests(path: &Path, action: ManifestAction) -> Result<Vec<Value>, ControllerError> {
    let text = std::fs::read_to_string(path)?;
    parse_manifests(&text, action)
}

fn parse_manifests(text: &str, action: ManifestAction) -> Result<Vec<Value>, ControllerError> {
    let mut manifests = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let manifest = Value::deserialize(document)?;
        if manifest.is_null() {
            continue;
        }
        // Reject documents without an identity before touching the cluster.
        // Listing only needs apiVersion and kind.
        if action != ManifestAction::List {
            ResourceIdentity::from_manifest(&manifest)?;
        }
        manifests.push(manifest);
    }
    Ok(manifests)
}

async fn run(
    applier: &Applier,
    config: &ControllerConfig,
    manifests: &[Value],
    cancel: &CancellationToken,
) -> Result<(), ControllerError> {
    for manifest in manifests {
        if config.action == ManifestAction::List {
            for current in applier.list(manifest).await? {
                let identity = ResourceIdentity::from_manifest(&current)?;
                let verdict = kstatus::compute(&current)?;
                info!("{}: {}", identity, verdict);
                println!("---\n{}", serde_yaml::to_string(&current)?);
            }
            continue;
        }

        let identity = ResourceIdentity::from_manifest(manifest)?;
        match config.action {
            ManifestAction::Read => {
                let current = applier.read(manifest).await?;
                let verdict = kstatus::compute(&current)?;
                info!("{}: {}", identity, verdict);
                println!("---\n{}", serde_yaml::to_string(&current)?);
            }
            ManifestAction::Delete => {
                applier.delete(manifest, config.dry_run, cancel).await?;
                info!("{} deleted", identity);
            }
            ManifestAction::Create => {
                applier.create(manifest, config.dry_run, cancel).await?;
                info!("{} created", identity);
            }
            ManifestAction::Update => {
                let previous = applier.read(manifest).await?;
                applier
                    .update(manifest, Some(&previous), config.dry_run, cancel)
                    .await?;
                info!("{} updated", identity);
            }
            ManifestAction::Apply => {
                applier.apply(manifest, config.dry_run, cancel).await?;
                info!("{} applied", identity);
            }
            // Listed above
            ManifestAction::List => {}
        }
    }
    Ok(())
}
