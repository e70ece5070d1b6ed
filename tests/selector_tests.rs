//! Namespace selection against realistic namespace objects.

mod common;

use cluster_secret_controller::controller::reconciler::partition_namespaces;
use cluster_secret_controller::controller::selector::{
    matches, matches_namespace, validate_terms, NamespaceAttributes, SelectorError,
};
use cluster_secret_controller::crd::{
    NamespaceSelectorRequirement, NamespaceSelectorTerm, SelectorOperator,
};
use cluster_secret_controller::store::MemoryStore;
use common::{field_term, label_term, names_matching, pairs};

fn namespace(name: &str, labels: &[(&str, &str)]) -> NamespaceAttributes {
    NamespaceAttributes::new(name, "Active", pairs(labels))
}

#[test]
fn name_regex_selects_prod_namespaces() {
    let store = MemoryStore::new();
    let namespaces = vec![
        store.add_namespace("staging", &[]),
        store.add_namespace("prod-b", &[]),
        store.add_namespace("prod-a", &[]),
    ];

    let (matched, avoided) = partition_namespaces(&names_matching("prod-.*"), &namespaces).unwrap();
    assert_eq!(matched, vec!["prod-a", "prod-b"]);
    assert_eq!(avoided, vec!["staging"]);
}

#[test]
fn empty_selector_matches_nothing() {
    assert!(!matches(&[], &namespace("default", &[("env", "prod")])).unwrap());
}

#[test]
fn empty_term_matches_everything() {
    let terms = vec![NamespaceSelectorTerm::default()];
    assert!(matches(&terms, &namespace("anything", &[])).unwrap());
}

#[test]
fn requirements_within_a_term_are_anded() {
    let terms = vec![NamespaceSelectorTerm {
        match_fields: vec![NamespaceSelectorRequirement::new(
            "metadata.name",
            SelectorOperator::InRegex,
            ["^team-"],
        )],
        match_expressions: vec![NamespaceSelectorRequirement::new(
            "env",
            SelectorOperator::In,
            ["prod"],
        )],
    }];

    assert!(matches(&terms, &namespace("team-a", &[("env", "prod")])).unwrap());
    assert!(!matches(&terms, &namespace("team-a", &[("env", "dev")])).unwrap());
    assert!(!matches(&terms, &namespace("infra", &[("env", "prod")])).unwrap());
}

#[test]
fn terms_are_ored() {
    let terms = vec![
        label_term("tier", SelectorOperator::In, &["gold"]),
        field_term("metadata.name", SelectorOperator::In, &["kube-public"]),
    ];

    assert!(matches(&terms, &namespace("kube-public", &[])).unwrap());
    assert!(matches(&terms, &namespace("a", &[("tier", "gold")])).unwrap());
    assert!(!matches(&terms, &namespace("a", &[("tier", "silver")])).unwrap());
}

#[test]
fn phase_is_selectable() {
    let terms = vec![field_term("status.phase", SelectorOperator::NotIn, &["Terminating"])];
    let active = namespace("a", &[]);
    let terminating = NamespaceAttributes::new("b", "Terminating", pairs(&[]));
    assert!(matches(&terms, &active).unwrap());
    assert!(!matches(&terms, &terminating).unwrap());
}

#[test]
fn missing_label_satisfies_negative_operators_only() {
    let unlabeled = namespace("a", &[]);
    let cases = [
        (SelectorOperator::In, vec!["x"], false),
        (SelectorOperator::NotIn, vec!["x"], true),
        (SelectorOperator::InRegex, vec!["x"], false),
        (SelectorOperator::NotInRegex, vec!["x"], true),
        (SelectorOperator::Exists, vec![], false),
        (SelectorOperator::DoesNotExist, vec![], true),
        (SelectorOperator::Gt, vec!["1"], false),
        (SelectorOperator::Lt, vec!["1"], false),
    ];
    for (operator, values, expected) in cases {
        let terms = vec![label_term("team", operator.clone(), &values)];
        assert_eq!(
            matches(&terms, &unlabeled).unwrap(),
            expected,
            "operator {operator}"
        );
    }
}

#[test]
fn ordering_compares_integers_and_ignores_non_numeric_labels() {
    let gt = vec![label_term("tier", SelectorOperator::Gt, &["2"])];
    let lt = vec![label_term("tier", SelectorOperator::Lt, &["2"])];

    assert!(matches(&gt, &namespace("a", &[("tier", "10")])).unwrap());
    assert!(!matches(&gt, &namespace("a", &[("tier", "2")])).unwrap());
    assert!(matches(&lt, &namespace("a", &[("tier", "-1")])).unwrap());

    // a label that is not a number never satisfies, and never errors
    assert!(!matches(&gt, &namespace("a", &[("tier", "gold")])).unwrap());
    assert!(!matches(&lt, &namespace("a", &[("tier", "gold")])).unwrap());
}

#[test]
fn regex_is_a_search_not_a_full_match() {
    let terms = names_matching("prod");
    assert!(matches(&terms, &namespace("my-prod-ns", &[])).unwrap());

    let anchored = names_matching("^prod$");
    assert!(!matches(&anchored, &namespace("my-prod-ns", &[])).unwrap());
    assert!(matches(&anchored, &namespace("prod", &[])).unwrap());
}

#[test]
fn broken_requirement_surfaces_when_reached() {
    let terms = vec![label_term("env", SelectorOperator::In, &[])];
    let err = matches(&terms, &namespace("a", &[("env", "x")])).unwrap_err();
    assert!(matches!(err, SelectorError::Required { .. }));
    assert_eq!(
        err.path().as_str(),
        "spec.namespaceSelectorTerm[0].matchExpressions[0].values"
    );
}

#[test]
fn earlier_matching_term_short_circuits_later_errors() {
    let terms = vec![
        NamespaceSelectorTerm::default(),
        label_term("env", SelectorOperator::InRegex, &["("]),
    ];
    assert!(matches(&terms, &namespace("a", &[])).unwrap());
    // full validation still reports the broken term
    let err = validate_terms(&terms).unwrap_err();
    assert!(matches!(err, SelectorError::Invalid { .. }));
    assert_eq!(
        err.path().as_str(),
        "spec.namespaceSelectorTerm[1].matchExpressions[0].values[0]"
    );
}

#[test]
fn unknown_operator_lists_supported_tokens() {
    let terms = vec![label_term(
        "env",
        SelectorOperator::Unsupported("Like".into()),
        &["x"],
    )];
    let err = validate_terms(&terms).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with(
        "spec.namespaceSelectorTerm[0].matchExpressions[0].operator: Unsupported value: \"Like\""
    ));
    assert!(message.contains("\"DoesNotExist\""));
}

#[test]
fn value_count_rules() {
    let exists_with_values = vec![label_term("env", SelectorOperator::Exists, &["x"])];
    assert!(matches!(
        validate_terms(&exists_with_values),
        Err(SelectorError::TooMany { max: 0, .. })
    ));

    let gt_two_values = vec![label_term("n", SelectorOperator::Gt, &["1", "2"])];
    assert!(matches!(
        validate_terms(&gt_two_values),
        Err(SelectorError::TooMany { max: 1, .. })
    ));

    let gt_not_integer = vec![label_term("n", SelectorOperator::Lt, &["one"])];
    assert!(matches!(
        validate_terms(&gt_not_integer),
        Err(SelectorError::Invalid { .. })
    ));
}

#[test]
fn namespace_objects_are_evaluated_directly() {
    let store = MemoryStore::new();
    let labeled = store.add_namespace("payments", &[("team", "billing")]);
    let terms = vec![label_term("team", SelectorOperator::Exists, &[])];
    assert!(matches_namespace(&terms, &labeled).unwrap());
}
