//! # Initialization
//!
//! Controller startup: rustls provider, tracing, metrics, probe server,
//! Kubernetes client and reconciler context.

use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::reconciler::Reconciler;
use crate::crd::ClusterSecret;
use crate::observability;
use crate::server::{start_server, ServerState};
use crate::store::KubeStore;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub controller_config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails when the probe server does not come up, the Kubernetes client cannot
/// be built, or metrics registration fails.
pub async fn initialize() -> Result<InitializationResult> {
    // must happen before any TLS connection is opened; an already installed
    // provider is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    observability::init_tracing("cluster_secret_controller=info");

    info!(
        version = env!("CARGO_PKG_VERSION"),
        build.timestamp = env!("BUILD_TIMESTAMP"),
        build.datetime = env!("BUILD_DATETIME"),
        build.git_hash = env!("BUILD_GIT_HASH"),
        "controller.starting"
    );

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let controller_config = ControllerConfig::from_env();
    let server_config = ServerConfig::from_env();
    info!(?controller_config, ?server_config, "controller.config_loaded");

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!(error = %e, "server.failed");
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    check_crd_queryable(&client).await;

    let store = Arc::new(KubeStore::new(client.clone()));
    let reconciler = Arc::new(Reconciler::new(store, controller_config.clone()));

    info!("controller.initialized");
    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        controller_config,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }
        if server_state.is_ready() {
            info!("server.ready");
            return Ok(());
        }
        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Log how many ClusterSecrets exist, or why they cannot be listed.
///
/// Existing resources are reconciled by the controller's initial listing;
/// this only surfaces a missing CRD or RBAC problem early.
async fn check_crd_queryable(client: &Client) {
    let api: Api<ClusterSecret> = Api::all(client.clone());
    match api.list_metadata(&ListParams::default()).await {
        Ok(list) => info!(count = list.items.len(), "controller.existing_resources"),
        Err(kube::Error::Api(e)) if e.code == 404 => warn!(
            "ClusterSecret CRD is not installed; run `crdgen | kubectl apply -f -`"
        ),
        Err(e) => warn!(error = %e, "controller.list_failed"),
    }
}
