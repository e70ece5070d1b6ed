//! # Object Store
//!
//! The cluster state the reconciler reads and writes, behind one trait.
//!
//! - `KubeStore` talks to the Kubernetes API server
//! - `MemoryStore` keeps everything in process, with optimistic concurrency
//!   and injectable failures; built for tests or with the `testing` feature

mod kubernetes;
#[cfg(any(test, feature = "testing"))]
mod memory;

pub use kubernetes::KubeStore;
#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryStore, StoreOperation};

pub use crate::constants::LABEL_OWNER_UID;

use crate::crd::ClusterSecret;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use thiserror::Error;

/// Failure of a single store call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },
    #[error("{kind} {name} was modified concurrently: {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },
    #[error("API request failed ({code:?}): {message}")]
    Api { code: Option<u16>, message: String },
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Read/write access to ClusterSecrets, namespaces and secrets.
///
/// Writes carry the object's `resourceVersion`; a stale version fails with
/// [`StoreError::Conflict`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a ClusterSecret; `None` when it does not exist
    async fn get_cluster_secret(&self, name: &str) -> Result<Option<ClusterSecret>, StoreError>;

    async fn list_cluster_secrets(&self) -> Result<Vec<ClusterSecret>, StoreError>;

    /// Replace metadata and spec of a ClusterSecret
    async fn replace_cluster_secret(
        &self,
        cluster_secret: &ClusterSecret,
    ) -> Result<ClusterSecret, StoreError>;

    /// Replace the status subresource of a ClusterSecret
    async fn replace_cluster_secret_status(
        &self,
        cluster_secret: &ClusterSecret,
    ) -> Result<ClusterSecret, StoreError>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, StoreError>;

    /// Fetch a secret; `None` when it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Every secret labelled with `owner_uid` under [`LABEL_OWNER_UID`] whose
    /// controller owner reference has that uid
    async fn list_secrets_owned_by(&self, owner_uid: &str) -> Result<Vec<Secret>, StoreError>;

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError>;

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret, StoreError>;

    /// Delete a secret in the background. Returns `false` when it was already gone.
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<bool, StoreError>;
}

/// Whether `secret` names `owner_uid` as its controller
#[must_use]
pub fn is_controlled_by(secret: &Secret, owner_uid: &str) -> bool {
    secret
        .metadata
        .owner_references
        .as_ref()
        .is_some_and(|refs| {
            refs.iter()
                .any(|r| r.controller == Some(true) && r.uid == owner_uid)
        })
}

/// Whether `secret` carries the owner label for `owner_uid`
#[must_use]
pub fn is_labelled_for(secret: &Secret, owner_uid: &str) -> bool {
    secret
        .metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(LABEL_OWNER_UID))
        .is_some_and(|uid| uid == owner_uid)
}

/// `namespace/name` of a namespaced object, for messages
#[must_use]
pub fn qualified_name(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
