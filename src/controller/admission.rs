//! # Admission
//!
//! Transport-agnostic defaulting and validation for ClusterSecret objects.
//! A webhook server (not part of this crate) would call these on create and
//! update; `csecctl validate` calls them on manifests offline.

use crate::constants::DEFAULT_SECRET_TYPE;
use crate::controller::selector::{validate_terms, SelectorError};
use crate::crd::{ClusterSecret, ClusterSecretSpec};
use k8s_openapi::ByteString;
use tracing::debug;

/// Default the secret type and fold `stringData` into `data`
pub fn apply_defaults(spec: &mut ClusterSecretSpec) {
    let template = &mut spec.template;
    if template.r#type.as_deref().is_none_or(str::is_empty) {
        template.r#type = Some(DEFAULT_SECRET_TYPE.to_string());
    }
    for (key, value) in std::mem::take(&mut template.string_data) {
        template.data.insert(key, ByteString(value.into_bytes()));
    }
}

/// Default a whole resource, including its status ratio
pub fn default_cluster_secret(cluster_secret: &mut ClusterSecret) {
    debug!(
        resource.name = cluster_secret.metadata.name.as_deref().unwrap_or_default(),
        "admission.defaulting"
    );
    apply_defaults(&mut cluster_secret.spec);
    if let Some(status) = cluster_secret.status.as_mut() {
        if status.ready_secrets_ratio.is_empty() {
            status.ready_secrets_ratio = crate::crd::default_ready_secrets_ratio();
        }
    }
}

/// Validate every selector requirement of the spec
pub fn validate_spec(spec: &ClusterSecretSpec) -> Result<(), SelectorError> {
    validate_terms(&spec.namespace_selector_terms)
}
