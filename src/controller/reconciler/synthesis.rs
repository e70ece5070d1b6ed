//! # Desired-State Synthesis
//!
//! Builds the secret a ClusterSecret should produce in every matched namespace.
//!
//! Data precedence, later wins per key:
//! 1. `dataFrom` entries, in list order
//! 2. `dataValueFrom` entries
//! 3. `template.data`, then `template.stringData`

use crate::config::SyncMarkers;
use crate::constants::{DEFAULT_SECRET_TYPE, LABEL_OWNER_UID};
use crate::crd::{ClusterSecret, DataFrom, DataValueFrom};
use crate::store::{ObjectStore, StoreError};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Failure resolving a single data source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("field .{0} must be set")]
    MissingField(&'static str),
    #[error("secret ({name}) from namespace ({namespace}) does not exist")]
    SecretNotFound { namespace: String, name: String },
    #[error("secret ({name}) from namespace ({namespace}) does not contain the data key ({key})")]
    KeyNotFound {
        namespace: String,
        name: String,
        key: String,
    },
    #[error("get secret ({name}) from namespace ({namespace}): {source}")]
    Store {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },
}

/// The desired secret could not be built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("spec.dataFrom[{index}]: {source}")]
    DataFrom {
        index: usize,
        #[source]
        source: ReferenceError,
    },
    #[error("spec.dataValueFrom.{key}: {source}")]
    DataValueFrom {
        key: String,
        #[source]
        source: ReferenceError,
    },
}

/// Build the desired secret for a ClusterSecret.
///
/// The result has no namespace and no owner reference; those are set per
/// namespace when the secret is written. The last-sync annotation is never
/// present so the output compares stably against observed copies.
pub async fn synthesize(
    cluster_secret: &ClusterSecret,
    store: &dyn ObjectStore,
    markers: &SyncMarkers,
) -> Result<Secret, SynthesisError> {
    let spec = &cluster_secret.spec;
    let mut data: BTreeMap<String, ByteString> = BTreeMap::new();

    for (index, entry) in spec.data_from.iter().enumerate() {
        let source_data = resolve_data_from(entry, store)
            .await
            .map_err(|source| SynthesisError::DataFrom { index, source })?;
        data.extend(source_data);
    }

    for (key, entry) in &spec.data_value_from {
        let value = resolve_data_value_from(entry, store)
            .await
            .map_err(|source| SynthesisError::DataValueFrom {
                key: key.clone(),
                source,
            })?;
        data.insert(key.clone(), value);
    }

    data.extend(
        spec.template
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    data.extend(
        spec.template
            .string_data
            .iter()
            .map(|(k, v)| (k.clone(), ByteString(v.clone().into_bytes()))),
    );

    let secret = Secret {
        metadata: desired_metadata(cluster_secret, markers),
        data: Some(data),
        type_: Some(desired_type(cluster_secret)),
        ..Default::default()
    };
    debug!(
        resource.name = cluster_secret.metadata.name.as_deref().unwrap_or_default(),
        secret = secret.metadata.name.as_deref().unwrap_or_default(),
        keys = secret.data.as_ref().map_or(0, BTreeMap::len),
        "synthesis.complete"
    );
    Ok(secret)
}

/// Name, labels and annotations of the desired secret
#[must_use]
pub fn desired_metadata(cluster_secret: &ClusterSecret, markers: &SyncMarkers) -> ObjectMeta {
    let template_meta = cluster_secret.spec.template.metadata.clone().unwrap_or_default();

    let mut labels = template_meta.labels;
    labels
        .entry(markers.managed_by_label.clone())
        .or_insert_with(|| markers.managed_by_value.clone());
    // the owner label backs the owned-secret lookup and is never user controlled
    labels.remove(LABEL_OWNER_UID);
    if let Some(uid) = cluster_secret.metadata.uid.as_deref() {
        labels.insert(LABEL_OWNER_UID.to_string(), uid.to_string());
    }

    let mut annotations = template_meta.annotations;
    annotations.insert(
        markers.created_by_annotation.clone(),
        markers.created_by_value.clone(),
    );
    annotations.insert(
        markers.version_annotation.clone(),
        markers.version_value.clone(),
    );
    annotations.remove(&markers.last_sync_annotation);

    ObjectMeta {
        name: Some(cluster_secret.secret_name().to_string()),
        labels: Some(labels),
        annotations: Some(annotations),
        ..Default::default()
    }
}

fn desired_type(cluster_secret: &ClusterSecret) -> String {
    cluster_secret
        .spec
        .template
        .r#type
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_SECRET_TYPE.to_string())
}

async fn fetch(
    store: &dyn ObjectStore,
    namespace: &str,
    name: &str,
) -> Result<Secret, ReferenceError> {
    match store.get_secret(namespace, name).await {
        Ok(Some(secret)) => Ok(secret),
        Ok(None) | Err(StoreError::NotFound { .. }) => Err(ReferenceError::SecretNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }),
        Err(source) => Err(ReferenceError::Store {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
        }),
    }
}

async fn resolve_data_from(
    entry: &DataFrom,
    store: &dyn ObjectStore,
) -> Result<BTreeMap<String, ByteString>, ReferenceError> {
    let reference = entry
        .secret_ref
        .as_ref()
        .ok_or(ReferenceError::MissingField("secretRef"))?;
    if reference.name.is_empty() {
        return Err(ReferenceError::MissingField("secretRef.name"));
    }
    if reference.namespace.is_empty() {
        return Err(ReferenceError::MissingField("secretRef.namespace"));
    }

    let secret = fetch(store, &reference.namespace, &reference.name).await?;
    Ok(secret.data.unwrap_or_default())
}

async fn resolve_data_value_from(
    entry: &DataValueFrom,
    store: &dyn ObjectStore,
) -> Result<ByteString, ReferenceError> {
    let reference = entry
        .secret_key_ref
        .as_ref()
        .ok_or(ReferenceError::MissingField("secretKeyRef"))?;
    if reference.name.is_empty() {
        return Err(ReferenceError::MissingField("secretKeyRef.name"));
    }
    if reference.namespace.is_empty() {
        return Err(ReferenceError::MissingField("secretKeyRef.namespace"));
    }
    if reference.key.is_empty() {
        return Err(ReferenceError::MissingField("secretKeyRef.key"));
    }

    let secret = fetch(store, &reference.namespace, &reference.name).await?;
    secret
        .data
        .and_then(|mut data| data.remove(&reference.key))
        .ok_or_else(|| ReferenceError::KeyNotFound {
            namespace: reference.namespace.clone(),
            name: reference.name.clone(),
            key: reference.key.clone(),
        })
}
