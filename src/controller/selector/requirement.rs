//! Requirement validation and evaluation.
//!
//! A requirement is compiled into a [`Predicate`] before it is tested, so the
//! admission path and the matcher share one set of validation rules.

use super::attributes::AttributeSet;
use super::error::{FieldPath, SelectorError};
use crate::crd::{NamespaceSelectorRequirement, SelectorOperator};
use regex::Regex;

/// Operand-checked form of a requirement's operator and values
#[derive(Debug, Clone)]
pub enum Predicate {
    In(Vec<String>),
    NotIn(Vec<String>),
    InRegex(Vec<Regex>),
    NotInRegex(Vec<Regex>),
    Exists,
    DoesNotExist,
    Gt(i64),
    Lt(i64),
}

/// A validated requirement, ready to be tested against attribute sets
#[derive(Debug, Clone)]
pub struct CompiledRequirement {
    pub key: String,
    pub predicate: Predicate,
}

impl CompiledRequirement {
    /// Validate a requirement; `path` points at the requirement itself.
    pub fn compile(
        requirement: &NamespaceSelectorRequirement,
        path: &FieldPath,
    ) -> Result<Self, SelectorError> {
        let values = &requirement.values;
        let values_path = path.child("values");

        let predicate = match &requirement.operator {
            SelectorOperator::In => Predicate::In(require_values(values, &values_path)?.to_vec()),
            SelectorOperator::NotIn => {
                Predicate::NotIn(require_values(values, &values_path)?.to_vec())
            }
            SelectorOperator::InRegex => {
                Predicate::InRegex(compile_patterns(values, &values_path)?)
            }
            SelectorOperator::NotInRegex => {
                Predicate::NotInRegex(compile_patterns(values, &values_path)?)
            }
            SelectorOperator::Exists => {
                forbid_values(values, &values_path)?;
                Predicate::Exists
            }
            SelectorOperator::DoesNotExist => {
                forbid_values(values, &values_path)?;
                Predicate::DoesNotExist
            }
            SelectorOperator::Gt => Predicate::Gt(single_integer(values, &values_path)?),
            SelectorOperator::Lt => Predicate::Lt(single_integer(values, &values_path)?),
            SelectorOperator::Unsupported(token) => {
                return Err(SelectorError::NotSupported {
                    path: path.child("operator"),
                    value: token.clone(),
                    supported: SelectorOperator::SUPPORTED
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                });
            }
        };

        Ok(Self {
            key: requirement.key.clone(),
            predicate,
        })
    }

    /// Test the requirement against one attribute set
    #[must_use]
    pub fn matches(&self, attributes: &AttributeSet) -> bool {
        let value = attributes.get(&self.key);
        match (&self.predicate, value) {
            (Predicate::Exists, found) => found.is_some(),
            (Predicate::DoesNotExist, found) => found.is_none(),
            (Predicate::NotIn(_) | Predicate::NotInRegex(_), None) => true,
            (_, None) => false,
            (Predicate::In(values), Some(v)) => values.contains(v),
            (Predicate::NotIn(values), Some(v)) => !values.contains(v),
            (Predicate::InRegex(patterns), Some(v)) => patterns.iter().any(|p| p.is_match(v)),
            (Predicate::NotInRegex(patterns), Some(v)) => !patterns.iter().any(|p| p.is_match(v)),
            // a non-numeric attribute simply does not satisfy an ordering requirement
            (Predicate::Gt(bound), Some(v)) => v.parse::<i64>().is_ok_and(|n| n > *bound),
            (Predicate::Lt(bound), Some(v)) => v.parse::<i64>().is_ok_and(|n| n < *bound),
        }
    }
}

/// Validate a requirement without keeping the compiled form
pub fn validate_requirement(
    requirement: &NamespaceSelectorRequirement,
    path: &FieldPath,
) -> Result<(), SelectorError> {
    CompiledRequirement::compile(requirement, path).map(|_| ())
}

fn require_values<'a>(
    values: &'a [String],
    path: &FieldPath,
) -> Result<&'a [String], SelectorError> {
    if values.is_empty() {
        return Err(SelectorError::Required {
            path: path.clone(),
            detail: "must have at least one element".to_string(),
        });
    }
    Ok(values)
}

fn forbid_values(values: &[String], path: &FieldPath) -> Result<(), SelectorError> {
    if values.is_empty() {
        Ok(())
    } else {
        Err(SelectorError::TooMany {
            path: path.clone(),
            actual: values.len(),
            max: 0,
        })
    }
}

fn compile_patterns(values: &[String], path: &FieldPath) -> Result<Vec<Regex>, SelectorError> {
    require_values(values, path)?
        .iter()
        .enumerate()
        .map(|(i, pattern)| {
            Regex::new(pattern).map_err(|e| SelectorError::Invalid {
                path: path.index(i),
                value: pattern.clone(),
                detail: e.to_string(),
            })
        })
        .collect()
}

fn single_integer(values: &[String], path: &FieldPath) -> Result<i64, SelectorError> {
    let values = require_values(values, path)?;
    if values.len() > 1 {
        return Err(SelectorError::TooMany {
            path: path.clone(),
            actual: values.len(),
            max: 1,
        });
    }
    values[0].parse::<i64>().map_err(|e| SelectorError::Invalid {
        path: path.index(0),
        value: values[0].clone(),
        detail: e.to_string(),
    })
}
