//! # Error Policy
//!
//! Handling of failed reconcile cycles and controller stream errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::ClusterSecret;
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::{self, Action};
use kube_runtime::watcher;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Requeue a failed cycle after the configured fixed delay.
///
/// Failures never stop the controller; the next attempt (or any watch event
/// in between) repairs whatever the failed cycle left behind.
pub fn handle_reconciliation_error(
    obj: Arc<ClusterSecret>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let requeue = ctx.config.reconciliation_error_requeue_duration();
    metrics::increment_reconciliation_errors(error.kind());
    error!(
        resource.name = name.as_str(),
        error.kind = error.kind(),
        error = %error,
        requeue_secs = requeue.as_secs(),
        "controller.reconciliation_error"
    );
    Action::requeue(requeue)
}

/// Coarse classification of watch failures, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorClass {
    /// The watched resource type is not served (CRD missing)
    NotFound,
    /// Credentials were rejected
    Unauthorized,
    /// The resource version expired; the watcher relists on its own
    Expired,
    /// The API server is throttling or initializing
    Throttled,
    Other,
}

impl WatchErrorClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WatchErrorClass::NotFound => "not-found",
            WatchErrorClass::Unauthorized => "unauthorized",
            WatchErrorClass::Expired => "expired",
            WatchErrorClass::Throttled => "throttled",
            WatchErrorClass::Other => "other",
        }
    }
}

/// Classify a watch error from its rendered message.
///
/// 404 is checked before 401 since a not-found body can surface with an
/// unauthorized-looking chain.
#[must_use]
pub fn classify_watch_error(message: &str) -> WatchErrorClass {
    let is_not_found = message.contains("404")
        || message.contains("NotFound")
        || message.contains("not found");
    if is_not_found {
        WatchErrorClass::NotFound
    } else if message.contains("401") || message.contains("Unauthorized") {
        WatchErrorClass::Unauthorized
    } else if message.contains("410")
        || message.contains("too old resource version")
        || message.contains("Expired")
    {
        WatchErrorClass::Expired
    } else if message.contains("429")
        || message.contains("TooManyRequests")
        || message.contains("storage is (re)initializing")
    {
        WatchErrorClass::Throttled
    } else {
        WatchErrorClass::Other
    }
}

/// Log an error item of the controller stream.
///
/// Reconciler failures were already handled by [`handle_reconciliation_error`];
/// only watch and queue failures are reported here.
pub fn handle_controller_error(err: &controller::Error<ReconcilerError, watcher::Error>) {
    match err {
        controller::Error::ReconcilerFailed(_, obj) => {
            debug!(resource.name = obj.name.as_str(), "controller.reconcile_failed");
        }
        controller::Error::ObjectNotFound(obj) => {
            debug!(resource.name = obj.name.as_str(), "controller.object_gone");
        }
        controller::Error::QueueError(e) => {
            let message = e.to_string();
            let class = classify_watch_error(&message);
            match class {
                WatchErrorClass::NotFound | WatchErrorClass::Unauthorized => error!(
                    class = class.as_str(),
                    error = message.as_str(),
                    "controller.watch_error"
                ),
                _ => warn!(
                    class = class.as_str(),
                    error = message.as_str(),
                    "controller.watch_error"
                ),
            }
        }
        other => warn!(error = %other, "controller.stream_error"),
    }
}
