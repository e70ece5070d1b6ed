//! # ClusterSecret Controller
//!
//! A Kubernetes controller that copies a cluster-scoped `ClusterSecret` into
//! every namespace matched by its namespace selector terms.
//!
//! ## Overview
//!
//! 1. **Selects namespaces** - `matchFields` on name and phase, `matchExpressions` on labels
//! 2. **Builds the secret** - inline data plus data copied from referenced secrets
//! 3. **Keeps copies in sync** - creates, updates, renames and removes owned secrets
//! 4. **Reports status** - matched and ready counts plus a `Ready` condition
//!
//! ## Features
//!
//! - **Namespace lifecycle aware**: new namespaces receive the secret immediately
//! - **Source tracking**: changes to referenced secrets propagate to all copies
//! - **Prometheus metrics**: `/metrics` on the metrics port
//! - **Health probes**: `/healthz` and `/readyz`

use anyhow::Result;
use cluster_secret_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.client, init.reconciler, init.server_state).await
}
