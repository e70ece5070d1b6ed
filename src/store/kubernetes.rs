//! Kubernetes API backed [`ObjectStore`].

use super::{is_controlled_by, qualified_name, ObjectStore, StoreError, LABEL_OWNER_UID};
use crate::crd::ClusterSecret;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use tracing::debug;

const CLUSTER_SECRET: &str = "ClusterSecret";
const SECRET: &str = "Secret";
const NAMESPACE: &str = "Namespace";

/// Object store backed by a Kubernetes client
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn cluster_secrets(&self) -> Api<ClusterSecret> {
        Api::all(self.client.clone())
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn map_error(kind: &'static str, name: String, err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound { kind, name },
        kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason == "AlreadyExists" => {
            StoreError::AlreadyExists { kind, name }
        }
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            kind,
            name,
            message: api_err.message.clone(),
        },
        kube::Error::Api(api_err) => StoreError::Api {
            code: Some(api_err.code),
            message: api_err.message.clone(),
        },
        kube::Error::SerdeError(e) => StoreError::Serialization(e.to_string()),
        other => StoreError::Api {
            code: None,
            message: other.to_string(),
        },
    }
}

/// Server-side selection of the secrets labelled for one owner
fn owned_secrets_params(owner_uid: &str) -> ListParams {
    ListParams::default().labels(&format!("{LABEL_OWNER_UID}={owner_uid}"))
}

fn object_name(secret: &Secret) -> (String, String) {
    (
        secret.metadata.namespace.clone().unwrap_or_default(),
        secret.metadata.name.clone().unwrap_or_default(),
    )
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get_cluster_secret(&self, name: &str) -> Result<Option<ClusterSecret>, StoreError> {
        self.cluster_secrets()
            .get_opt(name)
            .await
            .map_err(|e| map_error(CLUSTER_SECRET, name.to_string(), e))
    }

    async fn list_cluster_secrets(&self) -> Result<Vec<ClusterSecret>, StoreError> {
        self.cluster_secrets()
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| map_error(CLUSTER_SECRET, "*".to_string(), e))
    }

    async fn replace_cluster_secret(
        &self,
        cluster_secret: &ClusterSecret,
    ) -> Result<ClusterSecret, StoreError> {
        let name = cluster_secret.metadata.name.clone().unwrap_or_default();
        self.cluster_secrets()
            .replace(&name, &PostParams::default(), cluster_secret)
            .await
            .map_err(|e| map_error(CLUSTER_SECRET, name, e))
    }

    async fn replace_cluster_secret_status(
        &self,
        cluster_secret: &ClusterSecret,
    ) -> Result<ClusterSecret, StoreError> {
        let name = cluster_secret.metadata.name.clone().unwrap_or_default();
        // resourceVersion in a merge patch makes the API server enforce optimistic concurrency
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": cluster_secret.metadata.resource_version },
            "status": cluster_secret.status,
        });
        self.cluster_secrets()
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_error(CLUSTER_SECRET, name, e))
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, StoreError> {
        Api::<Namespace>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| map_error(NAMESPACE, "*".to_string(), e))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        self.secrets(namespace)
            .get_opt(name)
            .await
            .map_err(|e| map_error(SECRET, qualified_name(namespace, name), e))
    }

    async fn list_secrets_owned_by(&self, owner_uid: &str) -> Result<Vec<Secret>, StoreError> {
        let secrets = Api::<Secret>::all(self.client.clone())
            .list(&owned_secrets_params(owner_uid))
            .await
            .map_err(|e| map_error(SECRET, "*".to_string(), e))?;
        // labels are writable by anyone; the owner reference decides
        let owned: Vec<Secret> = secrets
            .items
            .into_iter()
            .filter(|s| is_controlled_by(s, owner_uid))
            .collect();
        debug!(owner.uid = owner_uid, count = owned.len(), "store.owned_secrets");
        Ok(owned)
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let (namespace, name) = object_name(secret);
        self.secrets(&namespace)
            .create(&PostParams::default(), secret)
            .await
            .map_err(|e| map_error(SECRET, qualified_name(&namespace, &name), e))
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let (namespace, name) = object_name(secret);
        self.secrets(&namespace)
            .replace(&name, &PostParams::default(), secret)
            .await
            .map_err(|e| map_error(SECRET, qualified_name(&namespace, &name), e))
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<bool, StoreError> {
        match self
            .secrets(namespace)
            .delete(name, &DeleteParams::background())
            .await
        {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(false),
            Err(e) => Err(map_error(SECRET, qualified_name(namespace, name), e)),
        }
    }
}
