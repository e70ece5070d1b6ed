//! # Namespace Selector Engine
//!
//! Decides which namespaces a ClusterSecret's selector terms admit.
//!
//! - `attributes.rs` - field and label attribute sets of a namespace
//! - `requirement.rs` - per-operator validation and evaluation
//! - `matching.rs` - term (AND) and selector (OR) evaluation
//! - `error.rs` - field-path errors shared with admission validation

mod attributes;
mod error;
mod matching;
mod requirement;

pub use attributes::{AttributeSet, NamespaceAttributes};
pub use error::{FieldPath, SelectorError};
pub use matching::{matches, validate_terms, SelectorMatcher, TERMS_PATH};
pub use requirement::{validate_requirement, CompiledRequirement, Predicate};

use crate::crd::NamespaceSelectorTerm;
use k8s_openapi::api::core::v1::Namespace;

/// Convenience wrapper evaluating terms directly against a namespace object
pub fn matches_namespace(
    terms: &[NamespaceSelectorTerm],
    namespace: &Namespace,
) -> Result<bool, SelectorError> {
    matches(terms, &NamespaceAttributes::from_namespace(namespace))
}
