//! # Secondary Triggers
//!
//! Maps namespace and secret events to the ClusterSecrets that must be
//! reconciled again.

use crate::controller::selector::matches_namespace;
use crate::crd::ClusterSecret;
use crate::store::is_controlled_by;
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::ResourceExt;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::watcher;
use std::collections::BTreeMap;
use tracing::warn;

/// ClusterSecrets whose selector admits a created or deleted namespace.
///
/// A ClusterSecret whose selector fails to evaluate is skipped; its own
/// reconcile reports the error.
pub fn cluster_secrets_for_namespace<'a>(
    namespace: &Namespace,
    cluster_secrets: impl IntoIterator<Item = &'a ClusterSecret>,
) -> Vec<ObjectRef<ClusterSecret>> {
    cluster_secrets
        .into_iter()
        .filter(|cs| {
            match matches_namespace(&cs.spec.namespace_selector_terms, namespace) {
                Ok(matched) => matched,
                Err(err) => {
                    warn!(
                        resource.name = cs.name_any().as_str(),
                        namespace = namespace.name_any().as_str(),
                        error = %err,
                        "trigger.namespace_match_failed"
                    );
                    false
                }
            }
        })
        .map(ObjectRef::from_obj)
        .collect()
}

/// ClusterSecrets affected by a change to `secret`: its controller, any
/// resource producing a secret of the same name, and any resource reading it
/// through `dataFrom` or `dataValueFrom`.
pub fn cluster_secrets_for_secret<'a>(
    secret: &Secret,
    cluster_secrets: impl IntoIterator<Item = &'a ClusterSecret>,
) -> Vec<ObjectRef<ClusterSecret>> {
    let name = secret.name_any();
    let namespace = secret.namespace().unwrap_or_default();

    cluster_secrets
        .into_iter()
        .filter(|cs| {
            let owned = cs
                .metadata
                .uid
                .as_deref()
                .is_some_and(|uid| is_controlled_by(secret, uid));
            owned || cs.secret_name() == name || cs.references_secret(&namespace, &name)
        })
        .map(ObjectRef::from_obj)
        .collect()
}

fn uid_of(namespace: &Namespace) -> Option<&str> {
    namespace.metadata.uid.as_deref()
}

/// Reduces a namespace watch to lifecycle changes.
///
/// Updates of a known namespace are dropped; only creations (a name with a
/// new uid) and deletions come through. After a relist the differences to
/// the previous listing are emitted, so creations and deletions missed while
/// the watch was down still trigger. The first listing emits nothing since
/// every ClusterSecret is reconciled at startup anyway.
#[derive(Debug, Default)]
pub struct NamespaceTracker {
    known: BTreeMap<String, Namespace>,
    relist: Option<BTreeMap<String, Namespace>>,
    synced: bool,
}

impl NamespaceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one watch event, returning the namespaces whose lifecycle changed
    pub fn observe(&mut self, event: watcher::Event<Namespace>) -> Vec<Namespace> {
        match event {
            watcher::Event::Apply(namespace) => {
                let name = namespace.name_any();
                let is_new = self.known.get(&name).and_then(uid_of) != uid_of(&namespace);
                self.known.insert(name, namespace.clone());
                if is_new {
                    vec![namespace]
                } else {
                    Vec::new()
                }
            }
            watcher::Event::Delete(namespace) => {
                self.known.remove(&namespace.name_any());
                vec![namespace]
            }
            watcher::Event::Init => {
                self.relist = Some(BTreeMap::new());
                Vec::new()
            }
            watcher::Event::InitApply(namespace) => {
                self.relist
                    .get_or_insert_with(BTreeMap::new)
                    .insert(namespace.name_any(), namespace);
                Vec::new()
            }
            watcher::Event::InitDone => {
                let fresh = self.relist.take().unwrap_or_default();
                let previous = std::mem::replace(&mut self.known, fresh);
                if !self.synced {
                    self.synced = true;
                    return Vec::new();
                }

                let created = self
                    .known
                    .iter()
                    .filter(|(name, ns)| previous.get(*name).and_then(uid_of) != uid_of(ns))
                    .map(|(_, ns)| ns.clone());
                let deleted = previous
                    .iter()
                    .filter(|(name, ns)| self.known.get(*name).and_then(uid_of) != uid_of(ns))
                    .map(|(_, ns)| ns.clone());
                created.chain(deleted).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        ClusterSecretSpec, DataValueFrom, NamespaceSelectorRequirement, NamespaceSelectorTerm,
        SecretKeyReference, SecretTemplateMetadata, SelectorOperator,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use kube::api::ObjectMeta;

    fn namespace(name: &str, uid: &str, labels: &[(&str, &str)]) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.into()),
                uid: Some(uid.into()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn selecting(name: &str, key: &str) -> ClusterSecret {
        let mut cs = ClusterSecret::new(
            name,
            ClusterSecretSpec {
                namespace_selector_terms: vec![NamespaceSelectorTerm {
                    match_expressions: vec![NamespaceSelectorRequirement::new(
                        key,
                        SelectorOperator::Exists,
                        Vec::<String>::new(),
                    )],
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        cs.metadata.uid = Some(format!("uid-{name}"));
        cs
    }

    fn names(refs: &[ObjectRef<ClusterSecret>]) -> Vec<&str> {
        refs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn namespace_maps_to_matching_selectors() {
        let all = [selecting("a", "team"), selecting("b", "env")];
        let refs = cluster_secrets_for_namespace(&namespace("ns", "1", &[("env", "x")]), &all);
        assert_eq!(names(&refs), vec!["b"]);
    }

    #[test]
    fn broken_selector_is_skipped() {
        let mut broken = selecting("broken", "env");
        broken.spec.namespace_selector_terms[0].match_expressions[0].operator =
            SelectorOperator::In;
        let all = [broken, selecting("ok", "env")];
        let refs = cluster_secrets_for_namespace(&namespace("ns", "1", &[("env", "x")]), &all);
        assert_eq!(names(&refs), vec!["ok"]);
    }

    #[test]
    fn secret_maps_to_owner_name_and_references() {
        let owner = selecting("owner", "env");
        let mut same_name = selecting("other", "env");
        same_name.spec.template.metadata = Some(SecretTemplateMetadata {
            name: Some("creds".into()),
            ..Default::default()
        });
        let mut reader = selecting("reader", "env");
        reader.spec.data_value_from.insert(
            "k".into(),
            DataValueFrom {
                secret_key_ref: Some(SecretKeyReference {
                    name: "creds".into(),
                    namespace: "src".into(),
                    key: "k".into(),
                }),
            },
        );
        let unrelated = selecting("unrelated", "env");

        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("creds".into()),
                namespace: Some("src".into()),
                owner_references: Some(vec![OwnerReference {
                    api_version: "clustersecret.io/v2".into(),
                    kind: "ClusterSecret".into(),
                    name: "owner".into(),
                    uid: "uid-owner".into(),
                    controller: Some(true),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            ..Default::default()
        };

        let all = [owner, same_name, reader, unrelated];
        let refs = cluster_secrets_for_secret(&secret, &all);
        assert_eq!(names(&refs), vec!["owner", "other", "reader"]);
    }

    #[test]
    fn tracker_emits_only_creations_and_deletions() {
        let mut tracker = NamespaceTracker::new();
        assert!(tracker.observe(watcher::Event::Init).is_empty());
        assert!(tracker
            .observe(watcher::Event::InitApply(namespace("a", "1", &[])))
            .is_empty());
        assert!(tracker.observe(watcher::Event::InitDone).is_empty());

        // label change on a known namespace
        assert!(tracker
            .observe(watcher::Event::Apply(namespace("a", "1", &[("env", "x")])))
            .is_empty());

        let created = tracker.observe(watcher::Event::Apply(namespace("b", "2", &[])));
        assert_eq!(created.len(), 1);

        let deleted = tracker.observe(watcher::Event::Delete(namespace("b", "2", &[])));
        assert_eq!(deleted.len(), 1);

        // same name, new uid
        let recreated = tracker.observe(watcher::Event::Apply(namespace("a", "3", &[])));
        assert_eq!(recreated.len(), 1);
    }

    #[test]
    fn relist_emits_missed_lifecycle_changes() {
        let mut tracker = NamespaceTracker::new();
        tracker.observe(watcher::Event::Init);
        tracker.observe(watcher::Event::InitApply(namespace("a", "1", &[])));
        tracker.observe(watcher::Event::InitApply(namespace("b", "2", &[])));
        tracker.observe(watcher::Event::InitDone);

        tracker.observe(watcher::Event::Init);
        tracker.observe(watcher::Event::InitApply(namespace("a", "1", &[("env", "y")])));
        tracker.observe(watcher::Event::InitApply(namespace("c", "4", &[])));
        let changed = tracker.observe(watcher::Event::InitDone);

        let mut changed: Vec<String> = changed.iter().map(ResourceExt::name_any).collect();
        changed.sort();
        assert_eq!(changed, vec!["b", "c"]);
    }
}
