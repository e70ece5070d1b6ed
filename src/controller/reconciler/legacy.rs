//! Removal of markers left behind by the earlier Python (kopf) controller.

use crate::config::SyncMarkers;
use crate::crd::ClusterSecret;

/// Strip the legacy finalizer and annotation. Returns whether anything changed.
pub fn strip_legacy_markers(cluster_secret: &mut ClusterSecret, markers: &SyncMarkers) -> bool {
    let mut changed = false;

    if let Some(finalizers) = cluster_secret.metadata.finalizers.as_mut() {
        let before = finalizers.len();
        finalizers.retain(|f| *f != markers.legacy_finalizer);
        changed |= finalizers.len() != before;
        if finalizers.is_empty() {
            cluster_secret.metadata.finalizers = None;
        }
    }

    if let Some(annotations) = cluster_secret.metadata.annotations.as_mut() {
        changed |= annotations.remove(&markers.legacy_annotation).is_some();
        if annotations.is_empty() {
            cluster_secret.metadata.annotations = None;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ClusterSecretSpec;
    use std::collections::BTreeMap;

    #[test]
    fn removes_only_legacy_markers() {
        let markers = SyncMarkers::default();
        let mut cs = ClusterSecret::new("c", ClusterSecretSpec::default());
        cs.metadata.finalizers = Some(vec![
            markers.legacy_finalizer.clone(),
            "example.com/keep".to_string(),
        ]);
        cs.metadata.annotations = Some(BTreeMap::from([
            (markers.legacy_annotation.clone(), "{}".to_string()),
            ("team".to_string(), "a".to_string()),
        ]));

        assert!(strip_legacy_markers(&mut cs, &markers));
        assert_eq!(
            cs.metadata.finalizers,
            Some(vec!["example.com/keep".to_string()])
        );
        assert_eq!(
            cs.metadata.annotations,
            Some(BTreeMap::from([("team".to_string(), "a".to_string())]))
        );
        assert!(!strip_legacy_markers(&mut cs, &markers));
    }

    #[test]
    fn clean_resource_is_untouched() {
        let mut cs = ClusterSecret::new("c", ClusterSecretSpec::default());
        assert!(!strip_legacy_markers(&mut cs, &SyncMarkers::default()));
        assert_eq!(cs.metadata.finalizers, None);
    }
}
