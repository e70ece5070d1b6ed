//! # Watch Loop
//!
//! Wires the ClusterSecret controller: the primary watch, the namespace
//! lifecycle trigger and the secret trigger.

use crate::controller::reconciler::{
    cluster_secrets_for_namespace, cluster_secrets_for_secret, reconcile, NamespaceTracker,
    Reconciler,
};
use crate::crd::ClusterSecret;
use crate::runtime::error_policy::{handle_controller_error, handle_reconciliation_error};
use crate::server::ServerState;
use futures::{stream, StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::Api;
use kube::Client;
use kube_runtime::{controller, watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info};

/// Run the controller until a shutdown signal arrives
///
/// # Errors
///
/// Currently infallible once started; the `Result` leaves room for startup
/// checks.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let cluster_secrets: Api<ClusterSecret> = Api::all(client.clone());
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client);

    let concurrency = reconciler.config.max_concurrent_reconciliations;
    let controller = Controller::new(cluster_secrets, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(concurrency));

    let namespace_index = controller.store();
    let secret_index = controller.store();

    let mut tracker = NamespaceTracker::new();
    let namespace_lifecycle = watcher(namespaces, watcher::Config::default())
        .map_ok(move |event| {
            stream::iter(
                tracker
                    .observe(event)
                    .into_iter()
                    .map(Ok::<Namespace, watcher::Error>),
            )
        })
        .try_flatten();

    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("controller.shutdown_requested");
            shutdown_state.set_ready(false);
        }
    });

    info!(concurrency, "controller.watch_starting");
    controller
        .watches_stream(namespace_lifecycle, move |namespace: Namespace| {
            let known = namespace_index.state();
            cluster_secrets_for_namespace(&namespace, known.iter().map(|cs| &**cs))
        })
        .watches(secrets, watcher::Config::default(), move |secret: Secret| {
            let known = secret_index.state();
            cluster_secrets_for_secret(&secret, known.iter().map(|cs| &**cs))
        })
        .shutdown_on_signal()
        .run(reconcile, handle_reconciliation_error, reconciler)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => debug!(resource.name = obj.name.as_str(), "controller.reconciled"),
                Err(e) => handle_controller_error(&e),
            }
        })
        .await;

    server_state.set_ready(false);
    info!("controller.stopped");
    Ok(())
}
