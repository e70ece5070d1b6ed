//! # Reconciliation Logic
//!
//! One cycle for one ClusterSecret:
//!
//! 1. Fetch the resource and record a `Ready=Unknown` condition if none is set
//! 2. Strip markers left by the legacy controller
//! 3. List namespaces and the secrets owned by the resource
//! 4. Partition namespaces with the selector
//! 5. Synthesize the desired secret
//! 6. Classify owned secrets and matched namespaces
//! 7. Apply the plan
//! 8. Record counts and the final `Ready` condition

use super::apply::apply;
use super::classify::classify;
use super::legacy::strip_legacy_markers;
use super::status::{
    now_rfc3339, write_ready_condition, StatusCounts, StatusWrite, REASON_CONSTRUCTION_FAILED,
    REASON_PARTIALLY_FAILED, REASON_RECONCILING, REASON_SUCCEEDED,
};
use super::synthesis::synthesize;
use super::types::{CycleOutcome, CycleReport, Reconciler, ReconcilerError};
use crate::controller::selector::{NamespaceAttributes, SelectorError, SelectorMatcher};
use crate::crd::{ClusterSecret, ConditionStatus, NamespaceSelectorTerm};
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

/// Split namespaces into (matched, avoided), both sorted by name
pub fn partition_namespaces(
    terms: &[NamespaceSelectorTerm],
    namespaces: &[Namespace],
) -> Result<(Vec<String>, Vec<String>), SelectorError> {
    let mut matcher = SelectorMatcher::new(terms);
    let mut matched = Vec::new();
    let mut avoided = Vec::new();
    for namespace in namespaces {
        let name = namespace.name_any();
        if matcher.matches(&NamespaceAttributes::from_namespace(namespace))? {
            matched.push(name);
        } else {
            avoided.push(name);
        }
    }
    matched.sort();
    avoided.sort();
    Ok((matched, avoided))
}

/// Run one full cycle for the ClusterSecret called `name`
pub async fn run_cycle(reconciler: &Reconciler, name: &str) -> Result<CycleReport, ReconcilerError> {
    let store = reconciler.store.as_ref();
    let markers = &reconciler.markers;
    let attempts = reconciler.config.status_update_max_attempts;

    let Some(mut cluster_secret) = store.get_cluster_secret(name).await? else {
        debug!(resource.name = name, "reconcile.resource_gone");
        return Ok(CycleReport::gone());
    };

    let has_condition = cluster_secret
        .status
        .as_ref()
        .and_then(|s| s.ready_condition())
        .is_some();
    if !has_condition {
        let write = write_ready_condition(
            store,
            name,
            attempts,
            ConditionStatus::Unknown,
            REASON_RECONCILING,
            "Starting reconciliation",
            None,
        )
        .await?;
        match write.into_resource() {
            Some(updated) => cluster_secret = updated,
            None => return Ok(CycleReport::gone()),
        }
    }

    if strip_legacy_markers(&mut cluster_secret, markers) {
        cluster_secret = match store.replace_cluster_secret(&cluster_secret).await {
            Ok(updated) => updated,
            Err(err) if err.is_not_found() => return Ok(CycleReport::gone()),
            Err(err) => return Err(err.into()),
        };
        info!(resource.name = name, "reconcile.legacy_markers_removed");
    }

    let namespaces = store.list_namespaces().await?;
    let owned = match cluster_secret.metadata.uid.as_deref() {
        Some(uid) => store.list_secrets_owned_by(uid).await?,
        None => Vec::new(),
    };

    let (matched, avoided) =
        partition_namespaces(&cluster_secret.spec.namespace_selector_terms, &namespaces)?;
    metrics::set_matching_namespaces(name, matched.len());
    debug!(
        resource.name = name,
        matched = matched.len(),
        avoided = avoided.len(),
        owned = owned.len(),
        "reconcile.namespaces_partitioned"
    );

    let desired = match synthesize(&cluster_secret, store, markers).await {
        Ok(desired) => desired,
        Err(err) => {
            return construction_failed(reconciler, &cluster_secret, matched, avoided, &err.to_string())
                .await;
        }
    };

    let matched_set: BTreeSet<String> = matched.iter().cloned().collect();
    let plan = classify(owned, &matched_set, &desired, &markers.last_sync_annotation);
    let already_ready = plan.up_to_date.len();
    if plan.is_converged() {
        debug!(resource.name = name, "reconcile.converged");
    }

    let report = apply(
        store,
        &cluster_secret,
        &desired,
        plan,
        markers,
        &now_rfc3339(),
    )
    .await;
    let ready = already_ready + report.ready_gained();

    let (outcome, reason, message) = if report.has_failures() {
        let message = format!(
            "Failed to reconcile secret ({}) for custom resource ({name}):\n{}",
            cluster_secret.secret_name(),
            report.failure_lines().join("\n")
        );
        (CycleOutcome::PartiallyFailed, REASON_PARTIALLY_FAILED, message)
    } else {
        let message = format!(
            "Secrets for custom resource ({name}) on {} namespaces created successfully",
            matched.len()
        );
        (CycleOutcome::Synchronized, REASON_SUCCEEDED, message)
    };

    let counts = StatusCounts {
        data_count: Some(desired.data.as_ref().map_or(0, std::collections::BTreeMap::len)),
        matching_namespaces: matched.clone(),
        ready_secrets: ready,
    };
    let write = write_ready_condition(
        store,
        name,
        attempts,
        ConditionStatus::True,
        reason,
        &message,
        Some(&counts),
    )
    .await?;
    if matches!(write, StatusWrite::Gone) {
        return Ok(CycleReport::gone());
    }

    Ok(CycleReport {
        outcome,
        matched,
        avoided,
        ready,
        apply: report,
    })
}

/// Record a standing `Ready=False` for a secret that cannot be built
async fn construction_failed(
    reconciler: &Reconciler,
    cluster_secret: &ClusterSecret,
    matched: Vec<String>,
    avoided: Vec<String>,
    detail: &str,
) -> Result<CycleReport, ReconcilerError> {
    let name = cluster_secret.name_any();
    metrics::increment_synthesis_failures();
    error!(resource.name = name.as_str(), error = detail, "reconcile.construction_failed");

    let message = format!(
        "Failed to construct secret ({}) for custom resource ({name}): {detail}",
        cluster_secret.secret_name()
    );
    let counts = StatusCounts {
        data_count: None,
        matching_namespaces: matched.clone(),
        ready_secrets: 0,
    };
    write_ready_condition(
        reconciler.store.as_ref(),
        &name,
        reconciler.config.status_update_max_attempts,
        ConditionStatus::False,
        REASON_CONSTRUCTION_FAILED,
        &message,
        Some(&counts),
    )
    .await?;

    Ok(CycleReport {
        outcome: CycleOutcome::ConstructionFailed(detail.to_string()),
        matched,
        avoided,
        ready: 0,
        apply: super::apply::ApplyReport::default(),
    })
}

/// Controller entry point: one deadline-bounded cycle per trigger
pub async fn reconcile(
    cluster_secret: Arc<ClusterSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = cluster_secret.name_any();
    let span = info_span!("controller.reconcile", resource.name = name.as_str());
    let deadline = ctx.config.reconcile_timeout();
    let start = Instant::now();
    metrics::increment_reconciliations();

    let result = tokio::time::timeout(deadline, run_cycle(&ctx, &name).instrument(span.clone()))
        .await
        .unwrap_or(Err(ReconcilerError::DeadlineExceeded(deadline)));
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let report = result?;
    span.in_scope(|| {
        info!(
            outcome = report.outcome.as_str(),
            matched = report.matched.len(),
            ready = report.ready,
            failed = report.apply.failures().count(),
            elapsed_ms = start.elapsed().as_millis(),
            "reconcile.complete"
        );
    });

    if report.outcome == CycleOutcome::Gone {
        metrics::clear_matching_namespaces(&name);
        return Ok(Action::await_change());
    }
    Ok(match ctx.config.resync_interval() {
        Some(interval) => Action::requeue(interval),
        None => Action::await_change(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{NamespaceSelectorRequirement, SelectorOperator};
    use crate::store::MemoryStore;

    #[test]
    fn partition_sorts_both_sides() {
        let store = MemoryStore::new();
        let namespaces = vec![
            store.add_namespace("prod-b", &[]),
            store.add_namespace("dev", &[]),
            store.add_namespace("prod-a", &[]),
            store.add_namespace("ci", &[]),
        ];
        let terms = vec![NamespaceSelectorTerm {
            match_fields: vec![NamespaceSelectorRequirement::new(
                "metadata.name",
                SelectorOperator::InRegex,
                ["^prod-"],
            )],
            ..Default::default()
        }];

        let (matched, avoided) = partition_namespaces(&terms, &namespaces).unwrap();
        assert_eq!(matched, vec!["prod-a", "prod-b"]);
        assert_eq!(avoided, vec!["ci", "dev"]);
    }

    #[test]
    fn partition_surfaces_selector_errors() {
        let store = MemoryStore::new();
        let namespaces = vec![store.add_namespace("a", &[])];
        let terms = vec![NamespaceSelectorTerm {
            match_expressions: vec![NamespaceSelectorRequirement::new(
                "env",
                SelectorOperator::InRegex,
                ["("],
            )],
            ..Default::default()
        }];
        assert!(partition_namespaces(&terms, &namespaces).is_err());
    }
}
