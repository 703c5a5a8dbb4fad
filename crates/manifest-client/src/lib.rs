//! Kubernetes Manifest Client
//!
//! Reads and mutates arbitrary Kubernetes resources described by a manifest,
//! without compile-time knowledge of their types. Objects travel as
//! `serde_json::Value` trees, the shape the `kstatus` classifier consumes.
//!
//! # Example
//!
//! ```no_run
//! use manifest_client::{KubeManifestClient, ResourceIdentity};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeManifestClient::try_default().await?;
//!
//! let manifest = json!({
//!     "apiVersion": "v1",
//!     "kind": "ConfigMap",
//!     "metadata": { "name": "edge01", "namespace": "default" },
//!     "data": { "clusterName": "edge10" }
//! });
//!
//! client.create(&manifest, false).await?;
//! let current = client.get(&ResourceIdentity::from_manifest(&manifest)?).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod identity;
#[path = "trait.rs"]
pub mod manifest_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::KubeManifestClient;
pub use error::ManifestError;
pub use identity::ResourceIdentity;
pub use manifest_trait::ManifestClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockGet, MockManifestClient};
