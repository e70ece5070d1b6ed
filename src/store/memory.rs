//! In-process [`ObjectStore`].
//!
//! Mimics the API server behaviour the reconciler depends on: uid and
//! resourceVersion assignment, optimistic concurrency on replace, not-found and
//! already-exists errors. Failures can be injected per operation.

use super::{is_controlled_by, is_labelled_for, qualified_name, ObjectStore, StoreError};
use crate::crd::ClusterSecret;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, NamespaceStatus, Secret};
use kube::api::ObjectMeta;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Store calls, used to inject failures and to inspect the write log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    GetClusterSecret,
    ListClusterSecrets,
    ReplaceClusterSecret,
    ReplaceClusterSecretStatus,
    ListNamespaces,
    GetSecret,
    ListOwnedSecrets,
    CreateSecret,
    ReplaceSecret,
    DeleteSecret,
}

impl StoreOperation {
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(
            self,
            StoreOperation::ReplaceClusterSecret
                | StoreOperation::ReplaceClusterSecretStatus
                | StoreOperation::CreateSecret
                | StoreOperation::ReplaceSecret
                | StoreOperation::DeleteSecret
        )
    }
}

#[derive(Debug)]
struct InjectedFailure {
    operation: StoreOperation,
    /// Only fail calls touching this namespace (secret operations)
    namespace: Option<String>,
    error: StoreError,
}

#[derive(Debug, Default)]
struct State {
    cluster_secrets: BTreeMap<String, ClusterSecret>,
    namespaces: BTreeMap<String, Namespace>,
    secrets: BTreeMap<(String, String), Secret>,
    revision: u64,
    failures: VecDeque<InjectedFailure>,
    log: Vec<(StoreOperation, String)>,
}

impl State {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }

    fn next_uid(&mut self, prefix: &str) -> String {
        self.revision += 1;
        format!("{prefix}-{}", self.revision)
    }

    fn take_failure(
        &mut self,
        operation: StoreOperation,
        namespace: Option<&str>,
    ) -> Result<(), StoreError> {
        let position = self.failures.iter().position(|f| {
            f.operation == operation
                && f.namespace
                    .as_deref()
                    .is_none_or(|ns| namespace == Some(ns))
        });
        match position.and_then(|i| self.failures.remove(i)) {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }

    fn record(&mut self, operation: StoreOperation, target: String) {
        self.log.push((operation, target));
    }
}

/// Object store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an active namespace with the given labels
    pub fn add_namespace(&self, name: &str, labels: &[(&str, &str)]) -> Namespace {
        let mut state = self.lock();
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                uid: Some(state.next_uid("ns")),
                resource_version: Some(state.next_revision()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            status: Some(NamespaceStatus {
                phase: Some("Active".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        state
            .namespaces
            .insert(name.to_string(), namespace.clone());
        namespace
    }

    /// Remove a namespace and every secret in it
    pub fn remove_namespace(&self, name: &str) {
        let mut state = self.lock();
        state.namespaces.remove(name);
        state.secrets.retain(|(ns, _), _| ns != name);
    }

    /// Store a ClusterSecret as if it had been created through the API
    pub fn add_cluster_secret(&self, cluster_secret: &ClusterSecret) -> ClusterSecret {
        let mut state = self.lock();
        let mut stored = cluster_secret.clone();
        let name = stored.metadata.name.clone().unwrap_or_default();
        if stored.metadata.uid.is_none() {
            stored.metadata.uid = Some(state.next_uid("csec"));
        }
        stored.metadata.generation = Some(stored.metadata.generation.unwrap_or(1));
        stored.metadata.resource_version = Some(state.next_revision());
        state.cluster_secrets.insert(name, stored.clone());
        stored
    }

    /// Replace the spec of a stored ClusterSecret, bumping its generation
    pub fn update_cluster_secret_spec(&self, name: &str, spec: crate::crd::ClusterSecretSpec) {
        let mut state = self.lock();
        let revision = state.next_revision();
        if let Some(stored) = state.cluster_secrets.get_mut(name) {
            stored.spec = spec;
            stored.metadata.generation = Some(stored.metadata.generation.unwrap_or(0) + 1);
            stored.metadata.resource_version = Some(revision);
        }
    }

    pub fn remove_cluster_secret(&self, name: &str) {
        self.lock().cluster_secrets.remove(name);
    }

    /// Store a secret directly, bypassing failure injection and the write log
    pub fn add_secret(&self, secret: &Secret) -> Secret {
        let mut state = self.lock();
        let mut stored = secret.clone();
        if stored.metadata.uid.is_none() {
            stored.metadata.uid = Some(state.next_uid("secret"));
        }
        stored.metadata.resource_version = Some(state.next_revision());
        let key = (
            stored.metadata.namespace.clone().unwrap_or_default(),
            stored.metadata.name.clone().unwrap_or_default(),
        );
        state.secrets.insert(key, stored.clone());
        stored
    }

    #[must_use]
    pub fn cluster_secret(&self, name: &str) -> Option<ClusterSecret> {
        self.lock().cluster_secrets.get(name).cloned()
    }

    #[must_use]
    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.lock()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Every stored secret, ordered by namespace then name
    #[must_use]
    pub fn secrets(&self) -> Vec<Secret> {
        self.lock().secrets.values().cloned().collect()
    }

    /// Fail the next matching call with `error`
    pub fn fail_next(
        &self,
        operation: StoreOperation,
        namespace: Option<&str>,
        error: StoreError,
    ) {
        self.lock().failures.push_back(InjectedFailure {
            operation,
            namespace: namespace.map(ToString::to_string),
            error,
        });
    }

    /// Write calls made so far, as `(operation, target)`
    #[must_use]
    pub fn writes(&self) -> Vec<(StoreOperation, String)> {
        self.lock()
            .log
            .iter()
            .filter(|(op, _)| op.is_write())
            .cloned()
            .collect()
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
    }
}

fn secret_key(secret: &Secret) -> (String, String) {
    (
        secret.metadata.namespace.clone().unwrap_or_default(),
        secret.metadata.name.clone().unwrap_or_default(),
    )
}

fn check_version(
    kind: &'static str,
    name: String,
    incoming: Option<&String>,
    stored: Option<&String>,
) -> Result<(), StoreError> {
    match incoming {
        Some(version) if Some(version) != stored => Err(StoreError::Conflict {
            kind,
            name,
            message: "the object has been modified; please apply your changes to the latest version and try again".to_string(),
        }),
        _ => Ok(()),
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_cluster_secret(&self, name: &str) -> Result<Option<ClusterSecret>, StoreError> {
        let mut state = self.lock();
        state.record(StoreOperation::GetClusterSecret, name.to_string());
        state.take_failure(StoreOperation::GetClusterSecret, None)?;
        Ok(state.cluster_secrets.get(name).cloned())
    }

    async fn list_cluster_secrets(&self) -> Result<Vec<ClusterSecret>, StoreError> {
        let mut state = self.lock();
        state.record(StoreOperation::ListClusterSecrets, String::new());
        state.take_failure(StoreOperation::ListClusterSecrets, None)?;
        Ok(state.cluster_secrets.values().cloned().collect())
    }

    async fn replace_cluster_secret(
        &self,
        cluster_secret: &ClusterSecret,
    ) -> Result<ClusterSecret, StoreError> {
        let name = cluster_secret.metadata.name.clone().unwrap_or_default();
        let mut state = self.lock();
        state.record(StoreOperation::ReplaceClusterSecret, name.clone());
        state.take_failure(StoreOperation::ReplaceClusterSecret, None)?;
        let revision = state.next_revision();
        let stored = state
            .cluster_secrets
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound {
                kind: "ClusterSecret",
                name: name.clone(),
            })?;
        check_version(
            "ClusterSecret",
            name,
            cluster_secret.metadata.resource_version.as_ref(),
            stored.metadata.resource_version.as_ref(),
        )?;
        let status = stored.status.take();
        let generation = stored.metadata.generation;
        *stored = cluster_secret.clone();
        stored.status = status;
        stored.metadata.generation = generation;
        stored.metadata.resource_version = Some(revision);
        Ok(stored.clone())
    }

    async fn replace_cluster_secret_status(
        &self,
        cluster_secret: &ClusterSecret,
    ) -> Result<ClusterSecret, StoreError> {
        let name = cluster_secret.metadata.name.clone().unwrap_or_default();
        let mut state = self.lock();
        state.record(StoreOperation::ReplaceClusterSecretStatus, name.clone());
        state.take_failure(StoreOperation::ReplaceClusterSecretStatus, None)?;
        let revision = state.next_revision();
        let stored = state
            .cluster_secrets
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound {
                kind: "ClusterSecret",
                name: name.clone(),
            })?;
        check_version(
            "ClusterSecret",
            name,
            cluster_secret.metadata.resource_version.as_ref(),
            stored.metadata.resource_version.as_ref(),
        )?;
        stored.status.clone_from(&cluster_secret.status);
        stored.metadata.resource_version = Some(revision);
        Ok(stored.clone())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, StoreError> {
        let mut state = self.lock();
        state.record(StoreOperation::ListNamespaces, String::new());
        state.take_failure(StoreOperation::ListNamespaces, None)?;
        Ok(state.namespaces.values().cloned().collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        let mut state = self.lock();
        state.record(StoreOperation::GetSecret, qualified_name(namespace, name));
        state.take_failure(StoreOperation::GetSecret, Some(namespace))?;
        Ok(state
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_secrets_owned_by(&self, owner_uid: &str) -> Result<Vec<Secret>, StoreError> {
        let mut state = self.lock();
        state.record(StoreOperation::ListOwnedSecrets, owner_uid.to_string());
        state.take_failure(StoreOperation::ListOwnedSecrets, None)?;
        Ok(state
            .secrets
            .values()
            .filter(|s| is_labelled_for(s, owner_uid) && is_controlled_by(s, owner_uid))
            .cloned()
            .collect())
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = secret_key(secret);
        let target = qualified_name(&key.0, &key.1);
        let mut state = self.lock();
        state.record(StoreOperation::CreateSecret, target.clone());
        state.take_failure(StoreOperation::CreateSecret, Some(key.0.as_str()))?;
        if !state.namespaces.contains_key(&key.0) {
            return Err(StoreError::NotFound {
                kind: "Namespace",
                name: key.0,
            });
        }
        if state.secrets.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: "Secret",
                name: target,
            });
        }
        let mut stored = secret.clone();
        stored.metadata.uid = Some(state.next_uid("secret"));
        stored.metadata.resource_version = Some(state.next_revision());
        state.secrets.insert(key, stored.clone());
        Ok(stored)
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret, StoreError> {
        let key = secret_key(secret);
        let target = qualified_name(&key.0, &key.1);
        let mut state = self.lock();
        state.record(StoreOperation::ReplaceSecret, target.clone());
        state.take_failure(StoreOperation::ReplaceSecret, Some(key.0.as_str()))?;
        let revision = state.next_revision();
        let stored = state
            .secrets
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Secret",
                name: target.clone(),
            })?;
        check_version(
            "Secret",
            target,
            secret.metadata.resource_version.as_ref(),
            stored.metadata.resource_version.as_ref(),
        )?;
        let uid = stored.metadata.uid.clone();
        *stored = secret.clone();
        stored.metadata.uid = uid;
        stored.metadata.resource_version = Some(revision);
        Ok(stored.clone())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.record(StoreOperation::DeleteSecret, qualified_name(namespace, name));
        state.take_failure(StoreOperation::DeleteSecret, Some(namespace))?;
        Ok(state
            .secrets
            .remove(&(namespace.to_string(), name.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(namespace: &str, name: &str) -> Secret {
        Secret {
            metadata: ObjectMeta {
                namespace: Some(namespace.into()),
                name: Some(name.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn stale_replace_conflicts() {
        let store = MemoryStore::new();
        store.add_namespace("ns", &[]);
        let created = store.create_secret(&secret("ns", "s")).await.unwrap();

        store.replace_secret(&created).await.unwrap();
        let err = store.replace_secret(&created).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn create_requires_namespace_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let err = store.create_secret(&secret("missing", "s")).await.unwrap_err();
        assert!(err.is_not_found());

        store.add_namespace("ns", &[]);
        store.create_secret(&secret("ns", "s")).await.unwrap();
        let err = store.create_secret(&secret("ns", "s")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn cluster_secrets_are_listed_by_name() {
        use crate::crd::ClusterSecretSpec;

        let store = MemoryStore::new();
        store.add_cluster_secret(&ClusterSecret::new("b", ClusterSecretSpec::default()));
        store.add_cluster_secret(&ClusterSecret::new("a", ClusterSecretSpec::default()));

        let names: Vec<String> = store
            .list_cluster_secrets()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|cs| cs.metadata.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn delete_of_absent_secret_reports_false() {
        let store = MemoryStore::new();
        assert!(!store.delete_secret("ns", "s").await.unwrap());
    }

    #[tokio::test]
    async fn injected_failure_is_scoped_to_namespace_and_consumed_once() {
        let store = MemoryStore::new();
        store.add_namespace("a", &[]);
        store.add_namespace("b", &[]);
        store.fail_next(
            StoreOperation::CreateSecret,
            Some("b"),
            StoreError::Api {
                code: Some(500),
                message: "boom".into(),
            },
        );

        store.create_secret(&secret("a", "s")).await.unwrap();
        assert!(store.create_secret(&secret("b", "s")).await.is_err());
        store.create_secret(&secret("b", "s")).await.unwrap();
        assert_eq!(store.writes().len(), 3);
    }
}
