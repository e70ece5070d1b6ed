//! # Sync Markers
//!
//! Reserved annotation and label keys the controller stamps on, or strips
//! from, the objects it manages.

use crate::constants::{
    ANNOTATION_CREATED_BY, ANNOTATION_LAST_SYNC, ANNOTATION_VERSION, LABEL_MANAGED_BY,
    LEGACY_ANNOTATION, LEGACY_FINALIZER, MANAGER_NAME,
};

/// Reserved marker keys and values.
///
/// Passed explicitly into synthesis and reconciliation so tests can substitute
/// their own values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMarkers {
    pub created_by_annotation: String,
    pub created_by_value: String,
    pub version_annotation: String,
    pub version_value: String,
    pub last_sync_annotation: String,
    pub managed_by_label: String,
    pub managed_by_value: String,
    pub legacy_finalizer: String,
    pub legacy_annotation: String,
}

impl SyncMarkers {
    /// Markers stamping the given controller version
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            created_by_annotation: ANNOTATION_CREATED_BY.to_string(),
            created_by_value: MANAGER_NAME.to_string(),
            version_annotation: ANNOTATION_VERSION.to_string(),
            version_value: version.into(),
            last_sync_annotation: ANNOTATION_LAST_SYNC.to_string(),
            managed_by_label: LABEL_MANAGED_BY.to_string(),
            managed_by_value: MANAGER_NAME.to_string(),
            legacy_finalizer: LEGACY_FINALIZER.to_string(),
            legacy_annotation: LEGACY_ANNOTATION.to_string(),
        }
    }
}

impl Default for SyncMarkers {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}
