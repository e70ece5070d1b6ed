//! Field-path validation errors for selector requirements.

use std::fmt;
use thiserror::Error;

/// Dotted path to a field, e.g. `spec.namespaceSelectorTerm[0].matchFields[1].values`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{name}", self.0))
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Invalid selector requirement, phrased like a Kubernetes field error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("{path}: Required value: {detail}")]
    Required { path: FieldPath, detail: String },
    #[error("{path}: Invalid value: {value:?}: {detail}")]
    Invalid {
        path: FieldPath,
        value: String,
        detail: String,
    },
    #[error("{path}: Too many: {actual}: must have at most {max} items")]
    TooMany {
        path: FieldPath,
        actual: usize,
        max: usize,
    },
    #[error("{path}: Unsupported value: {value:?}: supported values: {}", quoted(.supported))]
    NotSupported {
        path: FieldPath,
        value: String,
        supported: Vec<String>,
    },
}

impl SelectorError {
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        match self {
            SelectorError::Required { path, .. }
            | SelectorError::Invalid { path, .. }
            | SelectorError::TooMany { path, .. }
            | SelectorError::NotSupported { path, .. } => path,
        }
    }
}

fn quoted(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_compose() {
        let path = FieldPath::new("spec")
            .child("namespaceSelectorTerm")
            .index(0)
            .child("matchFields")
            .index(1)
            .child("values")
            .index(0);
        assert_eq!(
            path.as_str(),
            "spec.namespaceSelectorTerm[0].matchFields[1].values[0]"
        );
    }

    #[test]
    fn messages_follow_field_error_format() {
        let err = SelectorError::NotSupported {
            path: FieldPath::new("spec").child("operator"),
            value: "Matches".into(),
            supported: vec!["In".into(), "NotIn".into()],
        };
        assert_eq!(
            err.to_string(),
            r#"spec.operator: Unsupported value: "Matches": supported values: "In", "NotIn""#
        );

        let err = SelectorError::TooMany {
            path: FieldPath::new("values"),
            actual: 2,
            max: 1,
        };
        assert_eq!(err.to_string(), "values: Too many: 2: must have at most 1 items");
    }
}
