//! # ClusterSecret Spec
//!
//! Main CRD specification: selector terms, secret template and data sources.

use crate::crd::NamespaceSelectorTerm;
use k8s_openapi::ByteString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ClusterSecret Custom Resource Definition
///
/// A cluster-scoped resource whose template is copied into every namespace
/// admitted by its selector terms.
///
/// # Example
///
/// ```yaml
/// apiVersion: clustersecret.io/v2
/// kind: ClusterSecret
/// metadata:
///   name: registry-credentials
/// spec:
///   namespaceSelectorTerm:
///     - matchFields:
///         - key: metadata.name
///           operator: InRegex
///           values: ["^prod-"]
///   template:
///     type: kubernetes.io/dockerconfigjson
///   dataFrom:
///     - secretRef:
///         name: registry-credentials
///         namespace: platform
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ClusterSecret",
    group = "clustersecret.io",
    version = "v2",
    status = "crate::crd::ClusterSecretStatus",
    shortname = "csec",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.template.type"}, {"name":"Data", "type":"integer", "jsonPath":".status.dataCount"}, {"name":"Namespaces", "type":"string", "jsonPath":".status.readySecretsRatio"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSecretSpec {
    /// Namespace selector terms. Terms are ORed; an empty list selects no namespace.
    /// Kept under its historical singular name for compatibility with stored objects.
    #[serde(
        rename = "namespaceSelectorTerm",
        alias = "namespaceSelectorTerms",
        default
    )]
    pub namespace_selector_terms: Vec<NamespaceSelectorTerm>,
    /// Shape of the secret created in every selected namespace
    #[serde(default)]
    pub template: SecretTemplate,
    /// Whole secrets whose data is copied, applied in list order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_from: Vec<DataFrom>,
    /// Individual keys copied from other secrets, keyed by destination key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_value_from: BTreeMap<String, DataValueFrom>,
}

/// Template of the distributed secret
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SecretTemplateMetadata>,
    /// Base64 encoded values, same as `Secret.data`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[schemars(with = "BTreeMap<String, String>")]
    pub data: BTreeMap<String, ByteString>,
    /// Plain text values, overlaid on `data`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,
    /// Secret type, defaults to `Opaque`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}

/// Metadata applied to every distributed secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretTemplateMetadata {
    /// Secret name; defaults to the ClusterSecret name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataFrom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretReference>,
}

/// Reference to a whole secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataValueFrom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeyReference>,
}

/// Reference to a single key of a secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyReference {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub key: String,
}

impl SecretTemplate {
    /// Explicit secret name from the template, if set and non-empty
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

impl ClusterSecret {
    /// Name of the secret this resource produces in each namespace
    #[must_use]
    pub fn secret_name(&self) -> &str {
        self.spec
            .template
            .name()
            .or(self.metadata.name.as_deref())
            .unwrap_or_default()
    }

    /// Whether `dataFrom` or `dataValueFrom` points at the given secret
    #[must_use]
    pub fn references_secret(&self, namespace: &str, name: &str) -> bool {
        let from_whole = self
            .spec
            .data_from
            .iter()
            .filter_map(|d| d.secret_ref.as_ref())
            .any(|r| r.namespace == namespace && r.name == name);
        let from_key = self
            .spec
            .data_value_from
            .values()
            .filter_map(|d| d.secret_key_ref.as_ref())
            .any(|r| r.namespace == namespace && r.name == name);
        from_whole || from_key
    }
}
