//! # Types
//!
//! Core types for the reconciler.

use crate::config::{ControllerConfig, SyncMarkers};
use crate::controller::reconciler::apply::ApplyReport;
use crate::controller::selector::SelectorError;
use crate::store::{ObjectStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("namespace selector evaluation failed: {0}")]
    Selector(#[from] SelectorError),
    #[error("object store request failed: {0}")]
    Store(#[from] StoreError),
    #[error("status update for {name} kept conflicting after {attempts} attempts: {source}")]
    StatusConflict {
        name: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },
    #[error("reconcile cycle exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl ReconcilerError {
    /// Short label used for metrics and log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcilerError::Selector(_) => "selector",
            ReconcilerError::Store(_) => "store",
            ReconcilerError::StatusConflict { .. } => "status-conflict",
            ReconcilerError::DeadlineExceeded(_) => "deadline-exceeded",
        }
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The ClusterSecret no longer exists
    Gone,
    /// The desired secret could not be built; `Ready=False` was recorded
    ConstructionFailed(String),
    /// Every matched namespace holds an up to date copy
    Synchronized,
    /// Some apply items failed; the failures are listed in the condition
    PartiallyFailed,
}

impl CycleOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Gone => "gone",
            CycleOutcome::ConstructionFailed(_) => "construction-failed",
            CycleOutcome::Synchronized => "synchronized",
            CycleOutcome::PartiallyFailed => "partially-failed",
        }
    }
}

/// Summary of one reconcile cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Sorted namespaces admitted by the selector
    pub matched: Vec<String>,
    /// Sorted namespaces rejected by the selector
    pub avoided: Vec<String>,
    /// Namespaces holding an up to date copy at the end of the cycle
    pub ready: usize,
    pub apply: ApplyReport,
}

impl CycleReport {
    pub(crate) fn gone() -> Self {
        Self {
            outcome: CycleOutcome::Gone,
            matched: Vec::new(),
            avoided: Vec::new(),
            ready: 0,
            apply: ApplyReport::default(),
        }
    }
}

/// Shared reconciliation context
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ObjectStore>,
    pub config: ControllerConfig,
    pub markers: SyncMarkers,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Reconciler stamping the configured controller version
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: ControllerConfig) -> Self {
        let markers = SyncMarkers::new(config.controller_version.clone());
        Self {
            store,
            config,
            markers,
        }
    }

    #[must_use]
    pub fn with_markers(mut self, markers: SyncMarkers) -> Self {
        self.markers = markers;
        self
    }
}
