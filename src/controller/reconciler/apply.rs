//! # Apply
//!
//! Executes a classification against the object store. Every item is tried
//! independently; failures are collected, never rolled back.

use super::classify::{Classification, OutOfSync};
use super::diff::SecretDiff;
use crate::config::SyncMarkers;
use crate::crd::ClusterSecret;
use crate::observability::metrics;
use crate::store::{is_controlled_by, ObjectStore, StoreError};
use k8s_openapi::api::core::v1::Secret;
use kube::Resource;
use thiserror::Error;
use tracing::{info, warn};

/// Kind of write performed for one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    /// Delete a secret from a namespace that is no longer matched
    Remove,
    /// Update labels, annotations and data in place
    Update,
    /// Delete and recreate, for changes the API cannot apply in place (name, type)
    Replace,
    /// Create the secret in a newly matched namespace
    Create,
}

impl ApplyAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyAction::Remove => "remove",
            ApplyAction::Update => "update",
            ApplyAction::Replace => "replace",
            ApplyAction::Create => "create",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ApplyAction::Remove => "remove secret from namespace",
            ApplyAction::Update | ApplyAction::Replace => "update outdated secret in namespace",
            ApplyAction::Create => "add secret to namespace",
        }
    }

    /// Whether success leaves an up to date copy behind
    fn produces_ready_secret(self) -> bool {
        !matches!(self, ApplyAction::Remove)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("unable to delete old secret: {0}")]
    DeleteOld(#[source] StoreError),
    #[error("unable to remove existing secret that was created by an earlier ClusterSecret controller: {0}")]
    Takeover(#[source] StoreError),
    #[error("owner has no uid yet, cannot set controller reference")]
    MissingOwnerReference,
}

/// Result of one apply item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyItem {
    pub action: ApplyAction,
    pub namespace: String,
    pub secret: String,
    pub result: Result<(), ApplyError>,
}

impl ApplyItem {
    /// `- <action> (<namespace>): <error>` line for the condition message
    #[must_use]
    pub fn failure_line(&self) -> Option<String> {
        self.result.as_ref().err().map(|e| {
            format!("- {} ({}): {e}", self.action.describe(), self.namespace)
        })
    }
}

/// Per-item results of an apply pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub items: Vec<ApplyItem>,
}

impl ApplyReport {
    pub fn failures(&self) -> impl Iterator<Item = &ApplyItem> {
        self.items.iter().filter(|i| i.result.is_err())
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Namespaces that gained an up to date copy
    #[must_use]
    pub fn ready_gained(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.result.is_ok() && i.action.produces_ready_secret())
            .count()
    }

    /// Condition message lines for every failed item
    #[must_use]
    pub fn failure_lines(&self) -> Vec<String> {
        self.items.iter().filter_map(ApplyItem::failure_line).collect()
    }
}

/// Stamp a desired secret for one namespace
fn materialize(
    desired: &Secret,
    owner: &ClusterSecret,
    namespace: &str,
    markers: &SyncMarkers,
    now: &str,
) -> Result<Secret, ApplyError> {
    let owner_ref = owner
        .controller_owner_ref(&())
        .ok_or(ApplyError::MissingOwnerReference)?;
    let mut secret = desired.clone();
    secret.metadata.namespace = Some(namespace.to_string());
    secret.metadata.owner_references = Some(vec![owner_ref]);
    secret
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(markers.last_sync_annotation.clone(), now.to_string());
    Ok(secret)
}

async fn remove(store: &dyn ObjectStore, secret: &Secret) -> Result<(), ApplyError> {
    let namespace = secret.metadata.namespace.as_deref().unwrap_or_default();
    let name = secret.metadata.name.as_deref().unwrap_or_default();
    store.delete_secret(namespace, name).await?;
    metrics::increment_secrets_deleted();
    info!(namespace, secret = name, "secret.deleted");
    Ok(())
}

async fn replace(
    store: &dyn ObjectStore,
    owner: &ClusterSecret,
    desired: &Secret,
    observed: &Secret,
    markers: &SyncMarkers,
    now: &str,
) -> Result<(), ApplyError> {
    let namespace = observed.metadata.namespace.as_deref().unwrap_or_default();
    let old_name = observed.metadata.name.as_deref().unwrap_or_default();
    let fresh = materialize(desired, owner, namespace, markers, now)?;

    store
        .delete_secret(namespace, old_name)
        .await
        .map_err(ApplyError::DeleteOld)?;
    store.create_secret(&fresh).await?;
    metrics::increment_secrets_created();
    info!(
        namespace,
        old_secret = old_name,
        secret = fresh.metadata.name.as_deref().unwrap_or_default(),
        "secret.replaced"
    );
    Ok(())
}

async fn update(
    store: &dyn ObjectStore,
    desired: &Secret,
    observed: &Secret,
    markers: &SyncMarkers,
    now: &str,
) -> Result<(), ApplyError> {
    let mut updated = observed.clone();
    updated.metadata.labels.clone_from(&desired.metadata.labels);
    updated
        .metadata
        .annotations
        .clone_from(&desired.metadata.annotations);
    updated
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(markers.last_sync_annotation.clone(), now.to_string());
    updated.data.clone_from(&desired.data);
    updated.type_.clone_from(&desired.type_);
    updated.string_data = None;

    store.replace_secret(&updated).await?;
    metrics::increment_secrets_updated();
    info!(
        namespace = updated.metadata.namespace.as_deref().unwrap_or_default(),
        secret = updated.metadata.name.as_deref().unwrap_or_default(),
        "secret.updated"
    );
    Ok(())
}

async fn create(
    store: &dyn ObjectStore,
    owner: &ClusterSecret,
    desired: &Secret,
    namespace: &str,
    markers: &SyncMarkers,
    now: &str,
) -> Result<(), ApplyError> {
    let fresh = materialize(desired, owner, namespace, markers, now)?;
    let name = fresh.metadata.name.as_deref().unwrap_or_default();
    let owner_uid = owner.metadata.uid.as_deref().unwrap_or_default();

    // a same-named secret left by an earlier controller generation is taken over
    if let Some(existing) = store.get_secret(namespace, name).await? {
        let created_by_us = existing
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(&markers.created_by_annotation))
            .is_some_and(|v| *v == markers.created_by_value);
        let owned = is_controlled_by(&existing, owner_uid);
        // owned but missing the owner label, so invisible to the owned-secret lookup
        if owned && existing.type_ == fresh.type_ {
            let mut adopted = fresh.clone();
            adopted
                .metadata
                .resource_version
                .clone_from(&existing.metadata.resource_version);
            store.replace_secret(&adopted).await?;
            metrics::increment_secrets_updated();
            info!(namespace, secret = name, "secret.adopted");
            return Ok(());
        }
        if owned || created_by_us {
            store
                .delete_secret(namespace, name)
                .await
                .map_err(ApplyError::Takeover)?;
            info!(namespace, secret = name, "secret.taken_over");
        }
    }

    store.create_secret(&fresh).await?;
    metrics::increment_secrets_created();
    info!(namespace, secret = name, "secret.created");
    Ok(())
}

/// Execute the plan: remove unwanted, fix out-of-sync, create missing
pub async fn apply(
    store: &dyn ObjectStore,
    owner: &ClusterSecret,
    desired: &Secret,
    plan: Classification,
    markers: &SyncMarkers,
    now: &str,
) -> ApplyReport {
    let desired_name = desired.metadata.name.clone().unwrap_or_default();
    let mut report = ApplyReport::default();

    for secret in plan.unwanted {
        let result = remove(store, &secret).await;
        report.items.push(ApplyItem {
            action: ApplyAction::Remove,
            namespace: secret.metadata.namespace.clone().unwrap_or_default(),
            secret: secret.metadata.name.clone().unwrap_or_default(),
            result,
        });
    }

    for OutOfSync { observed, diff } in plan.out_of_sync {
        let action = match diff {
            SecretDiff::Name | SecretDiff::Type => ApplyAction::Replace,
            _ => ApplyAction::Update,
        };
        let result = match action {
            ApplyAction::Replace => replace(store, owner, desired, &observed, markers, now).await,
            _ => update(store, desired, &observed, markers, now).await,
        };
        report.items.push(ApplyItem {
            action,
            namespace: observed.metadata.namespace.clone().unwrap_or_default(),
            secret: desired_name.clone(),
            result,
        });
    }

    for namespace in plan.missing {
        let result = create(store, owner, desired, &namespace, markers, now).await;
        report.items.push(ApplyItem {
            action: ApplyAction::Create,
            namespace,
            secret: desired_name.clone(),
            result,
        });
    }

    for item in report.failures() {
        metrics::increment_apply_errors(item.action.as_str());
        if let Err(e) = &item.result {
            warn!(
                namespace = item.namespace.as_str(),
                secret = item.secret.as_str(),
                action = item.action.as_str(),
                error = %e,
                "secret.apply_failed"
            );
        }
    }

    report
}
