//! Desired-state synthesis and drift detection against stored source secrets.

mod common;

use cluster_secret_controller::config::SyncMarkers;
use cluster_secret_controller::controller::reconciler::{
    diff, synthesize, MapDiff, ReferenceError, SecretDiff, SynthesisError,
};
use cluster_secret_controller::crd::{
    ClusterSecret, DataFrom, DataValueFrom, SecretKeyReference, SecretReference,
    SecretTemplateMetadata,
};
use cluster_secret_controller::store::MemoryStore;
use common::{cluster_secret, data_of, pairs, secret};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

fn data_from(namespace: &str, name: &str) -> DataFrom {
    DataFrom {
        secret_ref: Some(SecretReference {
            name: name.into(),
            namespace: namespace.into(),
        }),
    }
}

fn value_from(namespace: &str, name: &str, key: &str) -> DataValueFrom {
    DataValueFrom {
        secret_key_ref: Some(SecretKeyReference {
            name: name.into(),
            namespace: namespace.into(),
            key: key.into(),
        }),
    }
}

#[tokio::test]
async fn later_sources_override_earlier_ones() {
    let store = MemoryStore::new();
    store.add_namespace("platform", &[]);
    store.add_secret(&secret("platform", "base", &[("x", "1"), ("y", "2")]));
    store.add_secret(&secret("platform", "overlay", &[("y", "3"), ("z", "7")]));

    let mut cs = cluster_secret("shared", Vec::new(), &[("x", "9")]);
    cs.spec.data_from = vec![data_from("platform", "base"), data_from("platform", "overlay")];

    let desired = synthesize(&cs, &store, &SyncMarkers::default()).await.unwrap();
    assert_eq!(
        data_of(&desired),
        pairs(&[("x", "9"), ("y", "3"), ("z", "7")])
    );
    assert_eq!(desired.type_.as_deref(), Some("Opaque"));
    assert_eq!(desired.metadata.name.as_deref(), Some("shared"));
}

#[tokio::test]
async fn single_keys_sit_between_data_from_and_template() {
    let store = MemoryStore::new();
    store.add_secret(&secret("platform", "base", &[("a", "from-base")]));
    store.add_secret(&secret("vault", "db", &[("password", "hunter2")]));

    let mut cs = cluster_secret("shared", Vec::new(), &[]);
    cs.spec.data_from = vec![data_from("platform", "base")];
    cs.spec.data_value_from = BTreeMap::from([
        ("a".to_string(), value_from("vault", "db", "password")),
        ("db-password".to_string(), value_from("vault", "db", "password")),
    ]);
    cs.spec
        .template
        .data
        .insert("db-password".into(), ByteString(b"pinned".to_vec()));

    let desired = synthesize(&cs, &store, &SyncMarkers::default()).await.unwrap();
    assert_eq!(
        data_of(&desired),
        pairs(&[("a", "hunter2"), ("db-password", "pinned")])
    );
}

#[tokio::test]
async fn string_data_wins_over_data() {
    let store = MemoryStore::new();
    let mut cs = cluster_secret("shared", Vec::new(), &[("k", "text")]);
    cs.spec
        .template
        .data
        .insert("k".into(), ByteString(b"binary".to_vec()));

    let desired = synthesize(&cs, &store, &SyncMarkers::default()).await.unwrap();
    assert_eq!(data_of(&desired), pairs(&[("k", "text")]));
}

#[tokio::test]
async fn metadata_carries_markers_and_template_fields() {
    let store = MemoryStore::new();
    let markers = SyncMarkers::new("1.2.3");
    let mut cs = cluster_secret("shared", Vec::new(), &[]);
    cs.spec.template.r#type = Some("kubernetes.io/tls".into());
    cs.spec.template.metadata = Some(SecretTemplateMetadata {
        name: Some("tls".into()),
        labels: pairs(&[("app", "web")]),
        annotations: pairs(&[
            ("note", "hello"),
            ("clustersecret.io/last-sync", "stale"),
        ]),
    });

    let desired = synthesize(&cs, &store, &markers).await.unwrap();
    let meta = &desired.metadata;
    assert_eq!(meta.name.as_deref(), Some("tls"));
    assert_eq!(desired.type_.as_deref(), Some("kubernetes.io/tls"));
    assert_eq!(
        meta.labels.clone().unwrap(),
        pairs(&[("app", "web"), ("app.kubernetes.io/managed-by", "ClusterSecrets")])
    );
    assert_eq!(
        meta.annotations.clone().unwrap(),
        pairs(&[
            ("clustersecret.io/created-by", "ClusterSecrets"),
            ("clustersecret.io/version", "1.2.3"),
            ("note", "hello"),
        ])
    );
    assert!(meta.namespace.is_none());
    assert!(meta.owner_references.is_none());
}

#[tokio::test]
async fn user_managed_by_label_is_kept() {
    let store = MemoryStore::new();
    let mut cs = cluster_secret("shared", Vec::new(), &[]);
    cs.spec.template.metadata = Some(SecretTemplateMetadata {
        labels: pairs(&[("app.kubernetes.io/managed-by", "helm")]),
        ..Default::default()
    });

    let desired = synthesize(&cs, &store, &SyncMarkers::default()).await.unwrap();
    assert_eq!(
        desired.metadata.labels.unwrap()["app.kubernetes.io/managed-by"],
        "helm"
    );
}

#[tokio::test]
async fn missing_source_secret_names_the_entry() {
    let store = MemoryStore::new();
    let mut cs = cluster_secret("shared", Vec::new(), &[]);
    cs.spec.data_from = vec![data_from("platform", "src")];

    let err = synthesize(&cs, &store, &SyncMarkers::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SynthesisError::DataFrom {
            index: 0,
            source: ReferenceError::SecretNotFound {
                namespace: "platform".into(),
                name: "src".into(),
            },
        }
    );
    assert_eq!(
        err.to_string(),
        "spec.dataFrom[0]: secret (src) from namespace (platform) does not exist"
    );
}

#[tokio::test]
async fn missing_key_and_missing_fields_are_reported() {
    let store = MemoryStore::new();
    store.add_secret(&secret("vault", "db", &[("user", "app")]));

    let mut cs = cluster_secret("shared", Vec::new(), &[]);
    cs.spec.data_value_from =
        BTreeMap::from([("pw".to_string(), value_from("vault", "db", "password"))]);
    let err = synthesize(&cs, &store, &SyncMarkers::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "spec.dataValueFrom.pw: secret (db) from namespace (vault) does not contain the data key (password)"
    );

    cs.spec.data_value_from =
        BTreeMap::from([("pw".to_string(), DataValueFrom { secret_key_ref: None })]);
    let err = synthesize(&cs, &store, &SyncMarkers::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::DataValueFrom {
            source: ReferenceError::MissingField(_),
            ..
        }
    ));
}

#[tokio::test]
async fn synthesis_is_deterministic_and_self_consistent() {
    let store = MemoryStore::new();
    store.add_secret(&secret("platform", "base", &[("a", "1")]));
    let mut cs = cluster_secret("shared", Vec::new(), &[("b", "2")]);
    cs.spec.data_from = vec![data_from("platform", "base")];
    let markers = SyncMarkers::default();

    let first = synthesize(&cs, &store, &markers).await.unwrap();
    let second = synthesize(&cs, &store, &markers).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(diff(&first, &second, &markers.last_sync_annotation), None);
}

#[tokio::test]
async fn drift_is_reported_by_priority() {
    let store = MemoryStore::new();
    let markers = SyncMarkers::default();
    let cs: ClusterSecret = cluster_secret("shared", Vec::new(), &[("k", "v")]);
    let desired = synthesize(&cs, &store, &markers).await.unwrap();
    let last_sync = markers.last_sync_annotation.as_str();

    // last-sync stamps never count as drift
    let mut observed = desired.clone();
    observed
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(last_sync.to_string(), "2026-01-01T00:00:00Z".into());
    assert_eq!(diff(&observed, &desired, last_sync), None);

    observed
        .data
        .get_or_insert_with(Default::default)
        .insert("k".into(), ByteString(b"changed".to_vec()));
    assert_eq!(
        diff(&observed, &desired, last_sync),
        Some(SecretDiff::Data(MapDiff::ValueMismatch("k".into())))
    );

    observed.type_ = Some("kubernetes.io/tls".into());
    assert_eq!(diff(&observed, &desired, last_sync), Some(SecretDiff::Type));

    observed.metadata.name = Some("old".into());
    assert_eq!(diff(&observed, &desired, last_sync), Some(SecretDiff::Name));
}
