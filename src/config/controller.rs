//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::env::{var_or_default, var_or_default_str};
use crate::constants::{
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_RECONCILE_TIMEOUT_SECS,
    DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS, DEFAULT_RESYNC_INTERVAL_SECS,
    DEFAULT_STATUS_UPDATE_MAX_ATTEMPTS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long to wait before retrying a failed reconciliation (seconds)
    pub reconciliation_error_requeue_secs: u64,
    /// Deadline for a single reconcile cycle (seconds)
    pub reconcile_timeout_secs: u64,
    /// Periodic resync interval (seconds). 0 means only react to watch events.
    pub resync_interval_secs: u64,
    /// Maximum number of ClusterSecrets reconciled simultaneously
    pub max_concurrent_reconciliations: u16,
    /// Attempts made for a status write that keeps hitting conflicts
    pub status_update_max_attempts: u32,
    /// Version stamped into the version annotation of managed secrets
    pub controller_version: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            status_update_max_attempts: DEFAULT_STATUS_UPDATE_MAX_ATTEMPTS,
            controller_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reconciliation_error_requeue_secs: var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                defaults.reconciliation_error_requeue_secs,
            ),
            reconcile_timeout_secs: var_or_default(
                "RECONCILE_TIMEOUT_SECS",
                defaults.reconcile_timeout_secs,
            ),
            resync_interval_secs: var_or_default(
                "RESYNC_INTERVAL_SECS",
                defaults.resync_interval_secs,
            ),
            max_concurrent_reconciliations: var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
            status_update_max_attempts: var_or_default(
                "STATUS_UPDATE_MAX_ATTEMPTS",
                defaults.status_update_max_attempts,
            )
            .max(1),
            controller_version: var_or_default_str(
                "CONTROLLER_VERSION",
                &defaults.controller_version,
            ),
        }
    }

    /// Get reconciliation error requeue duration
    #[must_use]
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get the per-cycle deadline
    #[must_use]
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    /// Get the periodic resync interval, if enabled
    #[must_use]
    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_interval_secs > 0).then(|| Duration::from_secs(self.resync_interval_secs))
    }
}
