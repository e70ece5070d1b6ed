//! # Namespace Selector
//!
//! Selector terms and requirements evaluated against namespace fields and labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single selector term.
///
/// `matchFields` is evaluated against the namespace field attributes
/// (`metadata.name`, `status.phase`), `matchExpressions` against its labels.
/// All requirements of a term must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelectorTerm {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<NamespaceSelectorRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_fields: Vec<NamespaceSelectorRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelectorRequirement {
    pub key: String,
    #[schemars(with = "String")]
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Requirement operator.
///
/// Unknown tokens deserialize into [`SelectorOperator::Unsupported`] so that a
/// stored object with a bad operator is still readable and gets rejected by
/// validation with a field error instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum SelectorOperator {
    In,
    NotIn,
    InRegex,
    NotInRegex,
    Exists,
    DoesNotExist,
    Gt,
    Lt,
    Unsupported(String),
}

impl SelectorOperator {
    /// Every supported operator token
    pub const SUPPORTED: [&'static str; 8] = [
        "In",
        "NotIn",
        "InRegex",
        "NotInRegex",
        "Exists",
        "DoesNotExist",
        "Gt",
        "Lt",
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SelectorOperator::In => "In",
            SelectorOperator::NotIn => "NotIn",
            SelectorOperator::InRegex => "InRegex",
            SelectorOperator::NotInRegex => "NotInRegex",
            SelectorOperator::Exists => "Exists",
            SelectorOperator::DoesNotExist => "DoesNotExist",
            SelectorOperator::Gt => "Gt",
            SelectorOperator::Lt => "Lt",
            SelectorOperator::Unsupported(other) => other,
        }
    }
}

impl From<String> for SelectorOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "In" => SelectorOperator::In,
            "NotIn" => SelectorOperator::NotIn,
            "InRegex" => SelectorOperator::InRegex,
            "NotInRegex" => SelectorOperator::NotInRegex,
            "Exists" => SelectorOperator::Exists,
            "DoesNotExist" => SelectorOperator::DoesNotExist,
            "Gt" => SelectorOperator::Gt,
            "Lt" => SelectorOperator::Lt,
            _ => SelectorOperator::Unsupported(value),
        }
    }
}

impl From<SelectorOperator> for String {
    fn from(value: SelectorOperator) -> Self {
        match value {
            SelectorOperator::Unsupported(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SelectorOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NamespaceSelectorRequirement {
    pub fn new<I, S>(key: impl Into<String>, operator: SelectorOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}
