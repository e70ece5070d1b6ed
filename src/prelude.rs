//! # Prelude
//!
//! Re-exports commonly used types for convenience.
//!
//! ```rust
//! use cluster_secret_controller::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, run_cycle, CycleOutcome, CycleReport, Reconciler, ReconcilerError,
};

// Selector engine
pub use crate::controller::selector::{matches_namespace, NamespaceAttributes, SelectorError};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, ServerConfig, SyncMarkers};

// Object store seam
pub use crate::store::{KubeStore, ObjectStore, StoreError};
#[cfg(any(test, feature = "testing"))]
pub use crate::store::MemoryStore;
