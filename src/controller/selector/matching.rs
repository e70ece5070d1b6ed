//! Term and selector evaluation.

use super::attributes::{AttributeSet, NamespaceAttributes};
use super::error::{FieldPath, SelectorError};
use super::requirement::{validate_requirement, CompiledRequirement};
use crate::crd::{NamespaceSelectorRequirement, NamespaceSelectorTerm};

/// Root path of selector terms in a ClusterSecret
pub const TERMS_PATH: &str = "spec.namespaceSelectorTerm";

fn terms_path() -> FieldPath {
    FieldPath::new("spec").child("namespaceSelectorTerm")
}

/// Whether any term admits the namespace.
///
/// Terms are ORed and the first matching term wins; an empty term list
/// matches nothing. Each requirement is validated right before it is tested,
/// so a broken requirement that is reached aborts evaluation with its error.
pub fn matches(
    terms: &[NamespaceSelectorTerm],
    namespace: &NamespaceAttributes,
) -> Result<bool, SelectorError> {
    SelectorMatcher::new(terms).matches(namespace)
}

type RequirementCache = Vec<Option<CompiledRequirement>>;

/// Selector terms evaluated against many namespaces.
///
/// A requirement is compiled the first time evaluation reaches it and reused
/// for every later namespace, so regexes are built at most once per matcher.
#[derive(Debug)]
pub struct SelectorMatcher<'a> {
    terms: &'a [NamespaceSelectorTerm],
    compiled: Vec<(RequirementCache, RequirementCache)>,
}

impl<'a> SelectorMatcher<'a> {
    #[must_use]
    pub fn new(terms: &'a [NamespaceSelectorTerm]) -> Self {
        let compiled = terms
            .iter()
            .map(|term| {
                (
                    vec![None; term.match_fields.len()],
                    vec![None; term.match_expressions.len()],
                )
            })
            .collect();
        Self { terms, compiled }
    }

    /// Whether any term admits the namespace; see [`matches`]
    pub fn matches(&mut self, namespace: &NamespaceAttributes) -> Result<bool, SelectorError> {
        let path = terms_path();
        let terms = self.terms;
        for (index, (term, (fields, expressions))) in
            terms.iter().zip(self.compiled.iter_mut()).enumerate()
        {
            let term_path = path.index(index);
            // an empty term always matches
            if all_match(
                &term.match_fields,
                fields,
                &namespace.fields,
                &term_path.child("matchFields"),
            )? && all_match(
                &term.match_expressions,
                expressions,
                &namespace.labels,
                &term_path.child("matchExpressions"),
            )? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn all_match(
    requirements: &[NamespaceSelectorRequirement],
    cache: &mut [Option<CompiledRequirement>],
    attributes: &AttributeSet,
    path: &FieldPath,
) -> Result<bool, SelectorError> {
    for (index, (requirement, slot)) in requirements.iter().zip(cache.iter_mut()).enumerate() {
        if slot.is_none() {
            *slot = Some(CompiledRequirement::compile(requirement, &path.index(index))?);
        }
        if !slot.as_ref().is_some_and(|compiled| compiled.matches(attributes)) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Validate every requirement of every term, returning the first error
pub fn validate_terms(terms: &[NamespaceSelectorTerm]) -> Result<(), SelectorError> {
    let path = terms_path();
    for (term_index, term) in terms.iter().enumerate() {
        let term_path = path.index(term_index);
        for (group, requirements) in [
            ("matchFields", &term.match_fields),
            ("matchExpressions", &term.match_expressions),
        ] {
            let group_path = term_path.child(group);
            for (index, requirement) in requirements.iter().enumerate() {
                validate_requirement(requirement, &group_path.index(index))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::SelectorOperator;
    use std::collections::BTreeMap;

    fn ns(name: &str, labels: &[(&str, &str)]) -> NamespaceAttributes {
        NamespaceAttributes::new(
            name,
            "Active",
            labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn field(op: SelectorOperator, values: &[&str]) -> NamespaceSelectorRequirement {
        NamespaceSelectorRequirement::new("metadata.name", op, values.iter().copied())
    }

    fn label(key: &str, op: SelectorOperator, values: &[&str]) -> NamespaceSelectorRequirement {
        NamespaceSelectorRequirement::new(key, op, values.iter().copied())
    }

    #[test]
    fn empty_terms_match_nothing() {
        assert!(!matches(&[], &ns("a", &[])).unwrap());
    }

    #[test]
    fn empty_term_matches_everything() {
        let terms = vec![NamespaceSelectorTerm::default()];
        assert!(matches(&terms, &ns("a", &[])).unwrap());
    }

    #[test]
    fn requirements_in_a_term_are_anded() {
        let terms = vec![NamespaceSelectorTerm {
            match_fields: vec![field(SelectorOperator::In, &["a"])],
            match_expressions: vec![label("env", SelectorOperator::In, &["prod"])],
        }];
        assert!(matches(&terms, &ns("a", &[("env", "prod")])).unwrap());
        assert!(!matches(&terms, &ns("a", &[("env", "dev")])).unwrap());
        assert!(!matches(&terms, &ns("b", &[("env", "prod")])).unwrap());
    }

    #[test]
    fn terms_are_ored() {
        let terms = vec![
            NamespaceSelectorTerm {
                match_fields: vec![field(SelectorOperator::In, &["a"])],
                ..Default::default()
            },
            NamespaceSelectorTerm {
                match_expressions: vec![label("env", SelectorOperator::Exists, &[])],
                ..Default::default()
            },
        ];
        assert!(matches(&terms, &ns("a", &[])).unwrap());
        assert!(matches(&terms, &ns("b", &[("env", "x")])).unwrap());
        assert!(!matches(&terms, &ns("b", &[])).unwrap());
    }

    #[test]
    fn phase_field_is_selectable() {
        let terms = vec![NamespaceSelectorTerm {
            match_fields: vec![NamespaceSelectorRequirement::new(
                "status.phase",
                SelectorOperator::NotIn,
                ["Terminating"],
            )],
            ..Default::default()
        }];
        assert!(matches(&terms, &ns("a", &[])).unwrap());
    }

    #[test]
    fn reached_invalid_requirement_errors_with_path() {
        let terms = vec![NamespaceSelectorTerm {
            match_fields: vec![
                field(SelectorOperator::Exists, &[]),
                field(SelectorOperator::Gt, &["abc"]),
            ],
            ..Default::default()
        }];
        let err = matches(&terms, &ns("a", &[])).unwrap_err();
        assert_eq!(
            err.path().as_str(),
            "spec.namespaceSelectorTerm[0].matchFields[1].values[0]"
        );
    }

    #[test]
    fn first_matching_term_short_circuits_later_errors() {
        let terms = vec![
            NamespaceSelectorTerm::default(),
            NamespaceSelectorTerm {
                match_fields: vec![field(SelectorOperator::In, &[])],
                ..Default::default()
            },
        ];
        assert!(matches(&terms, &ns("a", &[])).unwrap());
        assert!(validate_terms(&terms).is_err());
    }

    #[test]
    fn matcher_compiles_each_reached_requirement_once() {
        let terms = vec![
            NamespaceSelectorTerm {
                match_fields: vec![field(SelectorOperator::InRegex, &["^prod-"])],
                match_expressions: vec![label("env", SelectorOperator::Exists, &[])],
            },
            NamespaceSelectorTerm {
                match_fields: vec![field(SelectorOperator::InRegex, &["^team-"])],
                ..Default::default()
            },
        ];
        let mut matcher = SelectorMatcher::new(&terms);
        let compiled = |m: &SelectorMatcher<'_>| -> Vec<bool> {
            m.compiled
                .iter()
                .flat_map(|(f, e)| f.iter().chain(e.iter()))
                .map(Option::is_some)
                .collect()
        };

        // the label requirement is never reached for dev-a
        assert!(!matcher.matches(&ns("dev-a", &[])).unwrap());
        assert_eq!(compiled(&matcher), vec![true, false, true]);

        assert!(matcher.matches(&ns("prod-a", &[("env", "x")])).unwrap());
        assert!(matcher.matches(&ns("team-b", &[])).unwrap());
        assert!(!matcher.matches(&ns("prod-b", &[])).unwrap());
        assert_eq!(compiled(&matcher), vec![true, true, true]);
    }

    #[test]
    fn matcher_keeps_lazy_errors_per_namespace() {
        let terms = vec![
            NamespaceSelectorTerm {
                match_fields: vec![field(SelectorOperator::In, &["a"])],
                ..Default::default()
            },
            NamespaceSelectorTerm {
                match_fields: vec![field(SelectorOperator::InRegex, &["("])],
                ..Default::default()
            },
        ];
        let mut matcher = SelectorMatcher::new(&terms);
        assert!(matcher.matches(&ns("a", &[])).unwrap());
        let err = matcher.matches(&ns("b", &[])).unwrap_err();
        assert_eq!(
            err.path().as_str(),
            "spec.namespaceSelectorTerm[1].matchFields[0].values[0]"
        );
    }

    #[test]
    fn validate_terms_walks_expressions() {
        let terms = vec![NamespaceSelectorTerm {
            match_expressions: vec![label("env", SelectorOperator::InRegex, &["("])],
            ..Default::default()
        }];
        let err = validate_terms(&terms).unwrap_err();
        assert_eq!(
            err.path().as_str(),
            "spec.namespaceSelectorTerm[0].matchExpressions[0].values[0]"
        );
        assert!(err.to_string().starts_with(TERMS_PATH));
    }
}
