//! # Secret Diff
//!
//! Compares an observed secret with the desired one and names the first
//! difference found.

use crate::constants::DEFAULT_SECRET_TYPE;
use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use std::fmt;

/// First mismatching key of two maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapDiff {
    Missing(String),
    ValueMismatch(String),
    Excess(String),
}

impl fmt::Display for MapDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapDiff::Missing(key) => write!(f, "missing key: {key:?}"),
            MapDiff::ValueMismatch(key) => write!(f, "value does not match on key: {key:?}"),
            MapDiff::Excess(key) => write!(f, "excess key: {key:?}"),
        }
    }
}

/// Why an observed secret is out of sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretDiff {
    Name,
    Type,
    Labels(MapDiff),
    Annotations(MapDiff),
    Data(MapDiff),
}

impl fmt::Display for SecretDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretDiff::Name => f.write_str("name"),
            SecretDiff::Type => f.write_str("type"),
            SecretDiff::Labels(d) => write!(f, "labels: {d}"),
            SecretDiff::Annotations(d) => write!(f, "annotations: {d}"),
            SecretDiff::Data(d) => write!(f, "data: {d}"),
        }
    }
}

/// Compare `observed` against `desired`; `None` means up to date.
///
/// Checked in order: name, type (absent means `Opaque`), labels, annotations
/// without `last_sync_annotation`, then byte-exact data. Absent maps equal
/// empty maps.
#[must_use]
pub fn diff(observed: &Secret, desired: &Secret, last_sync_annotation: &str) -> Option<SecretDiff> {
    if observed.metadata.name != desired.metadata.name {
        return Some(SecretDiff::Name);
    }
    if secret_type(observed) != secret_type(desired) {
        return Some(SecretDiff::Type);
    }

    let empty = BTreeMap::new();
    if let Some(d) = diff_maps(
        desired.metadata.labels.as_ref().unwrap_or(&empty),
        observed.metadata.labels.as_ref().unwrap_or(&empty),
        |_| false,
    ) {
        return Some(SecretDiff::Labels(d));
    }
    if let Some(d) = diff_maps(
        desired.metadata.annotations.as_ref().unwrap_or(&empty),
        observed.metadata.annotations.as_ref().unwrap_or(&empty),
        |key| key == last_sync_annotation,
    ) {
        return Some(SecretDiff::Annotations(d));
    }

    let empty_data = BTreeMap::new();
    diff_maps(
        desired.data.as_ref().unwrap_or(&empty_data),
        observed.data.as_ref().unwrap_or(&empty_data),
        |_| false,
    )
    .map(SecretDiff::Data)
}

fn secret_type(secret: &Secret) -> &str {
    secret
        .type_
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SECRET_TYPE)
}

fn diff_maps<V: PartialEq>(
    want: &BTreeMap<String, V>,
    got: &BTreeMap<String, V>,
    ignored: impl Fn(&str) -> bool,
) -> Option<MapDiff> {
    for (key, value) in want.iter().filter(|(k, _)| !ignored(k)) {
        match got.get(key) {
            None => return Some(MapDiff::Missing(key.clone())),
            Some(other) if other != value => return Some(MapDiff::ValueMismatch(key.clone())),
            Some(_) => {}
        }
    }
    got.keys()
        .filter(|k| !ignored(k))
        .find(|k| !want.contains_key(*k))
        .map(|k| MapDiff::Excess(k.clone()))
}
