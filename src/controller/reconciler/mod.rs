//! # Reconciler
//!
//! Core reconciliation logic for `ClusterSecret` resources.
//!
//! The reconciler:
//! - Selects namespaces with the resource's selector terms
//! - Builds the desired secret from the template and referenced secrets
//! - Classifies the owned copies against it and applies the difference
//! - Records counts and a `Ready` condition on the resource status
//!
//! ## Modules
//!
//! - `synthesis` - desired secret construction
//! - `diff` / `classify` - sync verdicts and the per-cycle work plan
//! - `apply` - per-namespace writes with collected failures
//! - `status` - conflict-retrying status writes
//! - `legacy` - cleanup of markers from the previous controller
//! - `triggers` - namespace and secret event mapping
//! - `reconcile` - the cycle itself and the controller entry point

pub mod apply;
pub mod classify;
pub mod diff;
pub mod legacy;
pub mod reconcile;
pub mod status;
pub mod synthesis;
pub mod triggers;
pub mod types;

pub use apply::{ApplyAction, ApplyError, ApplyItem, ApplyReport};
pub use classify::{classify, Classification, OutOfSync};
pub use diff::{diff, MapDiff, SecretDiff};
pub use reconcile::{partition_namespaces, reconcile, run_cycle};
pub use status::{StatusCounts, StatusWrite};
pub use synthesis::{synthesize, ReferenceError, SynthesisError};
pub use triggers::{cluster_secrets_for_namespace, cluster_secrets_for_secret, NamespaceTracker};
pub use types::{CycleOutcome, CycleReport, Reconciler, ReconcilerError};
