//! # Custom Resource Definitions
//!
//! CRD types for the ClusterSecret controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - ClusterSecret specification, template and data sources
//! - `selector.rs` - Namespace selector terms, requirements and operators
//! - `status.rs` - Status and condition types

mod selector;
mod spec;
mod status;

pub use selector::{NamespaceSelectorRequirement, NamespaceSelectorTerm, SelectorOperator};
pub use spec::{
    ClusterSecret, ClusterSecretSpec, DataFrom, DataValueFrom, SecretKeyReference,
    SecretReference, SecretTemplate, SecretTemplateMetadata,
};
pub use status::{
    ClusterSecretStatus, Condition, ConditionStatus, default_ready_secrets_ratio,
};
