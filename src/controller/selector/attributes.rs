//! Attribute sets derived from a namespace.

use crate::constants::{FIELD_METADATA_NAME, FIELD_STATUS_PHASE};
use k8s_openapi::api::core::v1::Namespace;
use std::collections::BTreeMap;

/// Read-only key/value view a requirement is tested against
pub type AttributeSet = BTreeMap<String, String>;

/// Field and label attributes of one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceAttributes {
    /// Always holds `metadata.name` and `status.phase` (empty when unset)
    pub fields: AttributeSet,
    pub labels: AttributeSet,
}

impl NamespaceAttributes {
    #[must_use]
    pub fn from_namespace(namespace: &Namespace) -> Self {
        let name = namespace.metadata.name.clone().unwrap_or_default();
        let phase = namespace
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_default();
        Self::new(name, phase, namespace.metadata.labels.clone().unwrap_or_default())
    }

    #[must_use]
    pub fn new(name: impl Into<String>, phase: impl Into<String>, labels: AttributeSet) -> Self {
        let fields = AttributeSet::from([
            (FIELD_METADATA_NAME.to_string(), name.into()),
            (FIELD_STATUS_PHASE.to_string(), phase.into()),
        ]);
        Self { fields, labels }
    }
}
