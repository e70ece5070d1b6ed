//! # Match Command
//!
//! Dry run of a ClusterSecret's selector against the live namespaces.

use anyhow::{Context, Result};
use cluster_secret_controller::controller::reconciler::partition_namespaces;
use cluster_secret_controller::crd::ClusterSecret;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, ListParams},
    Client,
};

/// Print the namespaces a ClusterSecret's selector admits
pub async fn match_command(client: Client, name: &str, show_avoided: bool) -> Result<()> {
    let cluster_secrets: Api<ClusterSecret> = Api::all(client.clone());
    let namespaces: Api<Namespace> = Api::all(client);

    let cs = cluster_secrets
        .get(name)
        .await
        .with_context(|| format!("Failed to get ClusterSecret '{name}'"))?;
    let namespaces = namespaces
        .list(&ListParams::default())
        .await
        .context("Failed to list namespaces")?;

    let (matched, avoided) =
        partition_namespaces(&cs.spec.namespace_selector_terms, &namespaces.items)
            .with_context(|| format!("Selector of ClusterSecret '{name}' is invalid"))?;

    println!("Matched namespaces ({}):", matched.len());
    for namespace in &matched {
        println!("  + {namespace}");
    }
    if show_avoided {
        println!("Avoided namespaces ({}):", avoided.len());
        for namespace in &avoided {
            println!("  - {namespace}");
        }
    }

    Ok(())
}
