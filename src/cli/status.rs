//! # Status Command
//!
//! Command to show detailed status of a ClusterSecret resource.

use anyhow::{Context, Result};
use cluster_secret_controller::crd::ClusterSecret;
use kube::{api::Api, Client};

/// Show detailed status of a ClusterSecret resource
pub async fn status_command(client: Client, name: &str) -> Result<()> {
    let api: Api<ClusterSecret> = Api::all(client);
    let cs = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get ClusterSecret '{name}'"))?;

    println!("Resource Information:");
    println!("  Name: {name}");
    if let Some(uid) = &cs.metadata.uid {
        println!("  UID: {uid}");
    }
    if let Some(generation) = cs.metadata.generation {
        println!("  Generation: {generation}");
    }

    println!();
    println!("Spec:");
    println!("  Secret Name: {}", cs.secret_name());
    println!(
        "  Type: {}",
        cs.spec.template.r#type.as_deref().unwrap_or("Opaque")
    );
    println!("  Selector Terms: {}", cs.spec.namespace_selector_terms.len());
    println!("  Data From: {}", cs.spec.data_from.len());
    println!("  Data Value From: {}", cs.spec.data_value_from.len());

    let Some(status) = &cs.status else {
        println!();
        println!("Status: not yet reconciled");
        return Ok(());
    };

    println!();
    println!("Status:");
    println!("  Data Keys: {}", status.data_count);
    println!("  Ready Secrets: {}", status.ready_secrets_ratio);
    if !status.matching_namespaces.is_empty() {
        println!("  Matching Namespaces:");
        for namespace in &status.matching_namespaces {
            println!("    - {namespace}");
        }
    }

    if !status.conditions.is_empty() {
        println!();
        println!("Conditions:");
        for condition in &status.conditions {
            println!("  {}: {}", condition.r#type, condition.status);
            if let Some(reason) = &condition.reason {
                println!("    Reason: {reason}");
            }
            if let Some(time) = &condition.last_transition_time {
                println!("    Last Transition: {time}");
            }
            if let Some(generation) = condition.observed_generation {
                println!("    Observed Generation: {generation}");
            }
            if let Some(message) = &condition.message {
                for (i, line) in message.lines().enumerate() {
                    let label = if i == 0 { "Message:" } else { "        " };
                    println!("    {label} {line}");
                }
            }
        }
    }

    Ok(())
}
