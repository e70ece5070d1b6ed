//! Shared fixtures for the integration tests.
//!
//! Each test binary uses a different subset of these helpers.
#![allow(dead_code, reason = "not every test binary uses every fixture")]

use cluster_secret_controller::config::ControllerConfig;
use cluster_secret_controller::controller::reconciler::Reconciler;
use cluster_secret_controller::crd::{
    ClusterSecret, ClusterSecretSpec, NamespaceSelectorRequirement, NamespaceSelectorTerm,
    SelectorOperator,
};
use cluster_secret_controller::store::MemoryStore;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One term with a single `matchFields` requirement
pub fn field_term(key: &str, operator: SelectorOperator, values: &[&str]) -> NamespaceSelectorTerm {
    NamespaceSelectorTerm {
        match_fields: vec![NamespaceSelectorRequirement::new(
            key,
            operator,
            values.iter().copied(),
        )],
        ..Default::default()
    }
}

/// One term with a single `matchExpressions` requirement
pub fn label_term(key: &str, operator: SelectorOperator, values: &[&str]) -> NamespaceSelectorTerm {
    NamespaceSelectorTerm {
        match_expressions: vec![NamespaceSelectorRequirement::new(
            key,
            operator,
            values.iter().copied(),
        )],
        ..Default::default()
    }
}

/// Selector admitting namespaces whose name matches `pattern`
pub fn names_matching(pattern: &str) -> Vec<NamespaceSelectorTerm> {
    vec![field_term("metadata.name", SelectorOperator::InRegex, &[pattern])]
}

/// ClusterSecret with the given selector and plain-text template data
pub fn cluster_secret(
    name: &str,
    terms: Vec<NamespaceSelectorTerm>,
    string_data: &[(&str, &str)],
) -> ClusterSecret {
    let mut spec = ClusterSecretSpec {
        namespace_selector_terms: terms,
        ..Default::default()
    };
    spec.template.string_data = string_data
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    ClusterSecret::new(name, spec)
}

/// Secret with raw data, not owned by anything
pub fn secret(namespace: &str, name: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

/// Secret data decoded to strings, for readable assertions
pub fn data_of(secret: &Secret) -> BTreeMap<String, String> {
    secret
        .data
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, String::from_utf8_lossy(&v.0).into_owned()))
        .collect()
}

pub fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Reconciler over a memory store with default configuration
pub fn reconciler(store: &Arc<MemoryStore>) -> Reconciler {
    Reconciler::new(store.clone(), ControllerConfig::default())
}

/// Memory store holding the given active namespaces, without labels
pub fn store_with_namespaces(names: &[&str]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for name in names {
        store.add_namespace(name, &[]);
    }
    store
}
