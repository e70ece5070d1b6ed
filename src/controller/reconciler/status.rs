//! # Status
//!
//! Status writes for ClusterSecret resources.
//!
//! Every write re-fetches the resource, applies a mutation to its status and
//! writes it back with the fetched `resourceVersion`. Conflicts are retried a
//! bounded number of times; any other error fails immediately. A write whose
//! mutation leaves the status unchanged is skipped so a converged cycle does
//! not emit a watch event of its own.

use super::types::ReconcilerError;
use crate::crd::{ClusterSecret, ClusterSecretStatus, Condition, ConditionStatus};
use crate::observability::metrics;
use crate::store::ObjectStore;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

pub const REASON_RECONCILING: &str = "Reconciling";
pub const REASON_SUCCEEDED: &str = "ReconciliationSucceeded";
pub const REASON_PARTIALLY_FAILED: &str = "ReconciliationPartiallyFailed";
pub const REASON_CONSTRUCTION_FAILED: &str = "SecretConstructionFailed";

/// Result of a status write
#[derive(Debug, Clone)]
pub enum StatusWrite {
    /// The new status was stored
    Written(ClusterSecret),
    /// The stored status already matched
    Unchanged(ClusterSecret),
    /// The resource disappeared
    Gone,
}

impl StatusWrite {
    #[must_use]
    pub fn into_resource(self) -> Option<ClusterSecret> {
        match self {
            StatusWrite::Written(c) | StatusWrite::Unchanged(c) => Some(c),
            StatusWrite::Gone => None,
        }
    }
}

/// Counters recomputed at the end of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts {
    /// Keys of the desired secret; `None` keeps the stored value
    pub data_count: Option<usize>,
    /// Sorted matched namespaces
    pub matching_namespaces: Vec<String>,
    pub ready_secrets: usize,
}

impl StatusCounts {
    pub fn apply_to(&self, status: &mut ClusterSecretStatus) {
        if let Some(count) = self.data_count {
            status.data_count = to_i32(count);
        }
        status.matching_namespaces.clone_from(&self.matching_namespaces);
        status.matching_namespaces_count = to_i32(self.matching_namespaces.len());
        status.ready_secrets_count = to_i32(self.ready_secrets);
        status.ready_secrets_ratio = format!(
            "{}/{}",
            status.ready_secrets_count, status.matching_namespaces_count
        );
    }
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Current time in the format used for condition timestamps
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Re-fetch, mutate and write the status, retrying on conflicts.
pub async fn update_status_with_retry<F>(
    store: &dyn ObjectStore,
    name: &str,
    max_attempts: u32,
    mutate: F,
) -> Result<StatusWrite, ReconcilerError>
where
    F: Fn(&mut ClusterSecretStatus, Option<i64>) + Send + Sync,
{
    let attempts = max_attempts.max(1);
    let mut last_conflict = None;

    for attempt in 1..=attempts {
        let Some(mut current) = store.get_cluster_secret(name).await? else {
            return Ok(StatusWrite::Gone);
        };

        let previous = current.status.clone().unwrap_or_default();
        let mut next = previous.clone();
        mutate(&mut next, current.metadata.generation);
        if current.status.is_some() && next == previous {
            debug!(resource.name = name, "status.unchanged");
            return Ok(StatusWrite::Unchanged(current));
        }
        current.status = Some(next);

        match store.replace_cluster_secret_status(&current).await {
            Ok(updated) => return Ok(StatusWrite::Written(updated)),
            Err(err) if err.is_conflict() => {
                metrics::increment_status_update_retries();
                warn!(
                    resource.name = name,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "status.update_conflict"
                );
                last_conflict = Some(err);
            }
            Err(err) if err.is_not_found() => return Ok(StatusWrite::Gone),
            Err(err) => return Err(err.into()),
        }
    }

    Err(ReconcilerError::StatusConflict {
        name: name.to_string(),
        attempts,
        source: last_conflict.unwrap_or(crate::store::StoreError::Conflict {
            kind: "ClusterSecret",
            name: name.to_string(),
            message: "conflict".to_string(),
        }),
    })
}

/// Write the Ready condition, optionally refreshing the counters
pub async fn write_ready_condition(
    store: &dyn ObjectStore,
    name: &str,
    max_attempts: u32,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    counts: Option<&StatusCounts>,
) -> Result<StatusWrite, ReconcilerError> {
    let now = now_rfc3339();
    update_status_with_retry(store, name, max_attempts, |s, generation| {
        if let Some(counts) = counts {
            counts.apply_to(s);
        }
        s.set_condition(Condition::ready(status, reason, message, generation), &now);
    })
    .await
}
