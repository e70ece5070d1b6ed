//! # Classification
//!
//! Sorts observed owned secrets and matched namespaces into the four buckets
//! the apply step works from.

use super::diff::{diff, SecretDiff};
use k8s_openapi::api::core::v1::Secret;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// An owned secret that differs from the desired secret
#[derive(Debug, Clone)]
pub struct OutOfSync {
    pub observed: Secret,
    pub diff: SecretDiff,
}

/// Work plan for one cycle
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Owned secrets that must be deleted
    pub unwanted: Vec<Secret>,
    /// Owned secrets to update in place or rename
    pub out_of_sync: Vec<OutOfSync>,
    /// Owned secrets already matching the desired secret
    pub up_to_date: Vec<Secret>,
    /// Matched namespaces with no owned secret
    pub missing: Vec<String>,
}

impl Classification {
    /// Whether applying this plan would write anything
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.unwanted.is_empty() && self.out_of_sync.is_empty() && self.missing.is_empty()
    }
}

fn namespace_of(secret: &Secret) -> &str {
    secret.metadata.namespace.as_deref().unwrap_or_default()
}

fn name_of(secret: &Secret) -> &str {
    secret.metadata.name.as_deref().unwrap_or_default()
}

/// Classify owned secrets against the matched namespaces.
///
/// A secret in an unmatched namespace is unwanted. Within a matched namespace
/// the secret carrying the desired name is diffed; when none carries it, the
/// first secret by name is kept as a rename candidate. Every other owned
/// secret in that namespace is a stale duplicate and is unwanted.
#[must_use]
pub fn classify(
    owned: Vec<Secret>,
    matched: &BTreeSet<String>,
    desired: &Secret,
    last_sync_annotation: &str,
) -> Classification {
    let desired_name = desired.metadata.name.as_deref().unwrap_or_default();
    let mut plan = Classification::default();
    let mut by_namespace: BTreeMap<String, Vec<Secret>> = BTreeMap::new();

    for secret in owned {
        if matched.contains(namespace_of(&secret)) {
            by_namespace
                .entry(namespace_of(&secret).to_string())
                .or_default()
                .push(secret);
        } else {
            debug!(
                namespace = namespace_of(&secret),
                secret = name_of(&secret),
                "secret.unwanted"
            );
            plan.unwanted.push(secret);
        }
    }

    for (namespace, mut secrets) in by_namespace {
        secrets.sort_by(|a, b| name_of(a).cmp(name_of(b)));
        let keep = secrets
            .iter()
            .position(|s| name_of(s) == desired_name)
            .unwrap_or(0);
        let kept = secrets.remove(keep);
        for stale in secrets {
            debug!(
                namespace = namespace.as_str(),
                secret = name_of(&stale),
                "secret.stale_duplicate"
            );
            plan.unwanted.push(stale);
        }

        match diff(&kept, desired, last_sync_annotation) {
            None => {
                debug!(namespace = namespace.as_str(), "secret.up_to_date");
                plan.up_to_date.push(kept);
            }
            Some(cause) => {
                debug!(
                    namespace = namespace.as_str(),
                    cause = %cause,
                    "secret.out_of_sync"
                );
                plan.out_of_sync.push(OutOfSync {
                    observed: kept,
                    diff: cause,
                });
            }
        }
    }

    let covered: BTreeSet<&str> = plan
        .up_to_date
        .iter()
        .map(namespace_of)
        .chain(plan.out_of_sync.iter().map(|o| namespace_of(&o.observed)))
        .collect();
    plan.missing = matched
        .iter()
        .filter(|ns| !covered.contains(ns.as_str()))
        .cloned()
        .collect();

    plan
}
