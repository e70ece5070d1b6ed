//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 30;

/// Default deadline for a single reconcile cycle (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 60;

/// Default periodic resync interval (seconds); 0 disables periodic resync
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 0;

/// Default number of ClusterSecrets reconciled in parallel
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 4;

/// Default number of attempts for a conflicting status write
pub const DEFAULT_STATUS_UPDATE_MAX_ATTEMPTS: u32 = 3;

/// API group of the ClusterSecret resource
pub const API_GROUP: &str = "clustersecret.io";

/// Value of the created-by annotation and managed-by label
pub const MANAGER_NAME: &str = "ClusterSecrets";

/// Annotation stamped on every secret created by the controller
pub const ANNOTATION_CREATED_BY: &str = "clustersecret.io/created-by";

/// Annotation carrying the controller version that produced a secret
pub const ANNOTATION_VERSION: &str = "clustersecret.io/version";

/// Annotation recording when a secret was last written (RFC 3339, nanoseconds)
pub const ANNOTATION_LAST_SYNC: &str = "clustersecret.io/last-sync";

/// Standard managed-by label
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Label carrying the uid of the owning ClusterSecret; owned secrets are listed by it
pub const LABEL_OWNER_UID: &str = "clustersecret.io/owner-uid";

/// Finalizer left behind by the previous (kopf based) implementation
pub const LEGACY_FINALIZER: &str = "kopf.zalando.org/KopfFinalizerMarker";

/// Annotation left behind by the previous (kopf based) implementation
pub const LEGACY_ANNOTATION: &str = "kopf.zalando.org/last-handled-configuration";

/// Secret type used when none is specified
pub const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Type of the Ready condition
pub const CONDITION_READY: &str = "Ready";

/// Namespace field attribute: the namespace name
pub const FIELD_METADATA_NAME: &str = "metadata.name";

/// Namespace field attribute: the namespace lifecycle phase
pub const FIELD_STATUS_PHASE: &str = "status.phase";
