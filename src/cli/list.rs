//! # List Command
//!
//! Command to list all ClusterSecret resources.

use anyhow::{Context, Result};
use cluster_secret_controller::crd::ClusterSecret;
use cluster_secret_controller::store::{KubeStore, ObjectStore};
use kube::Client;

/// List all ClusterSecret resources
pub async fn list_command(client: Client) -> Result<()> {
    let cluster_secrets = KubeStore::new(client)
        .list_cluster_secrets()
        .await
        .context("Failed to list ClusterSecret resources")?;
    print_table(&cluster_secrets);
    Ok(())
}

fn print_table(cluster_secrets: &[ClusterSecret]) {
    if cluster_secrets.is_empty() {
        println!("No ClusterSecret resources found.");
        return;
    }

    println!(
        "{:<30} {:<30} {:<32} {:<6} {:<11} {:<8}",
        "NAME", "SECRET", "TYPE", "DATA", "NAMESPACES", "READY"
    );
    println!("{}", "-".repeat(122));
    for row in rows(cluster_secrets) {
        println!("{row}");
    }
}

fn rows(cluster_secrets: &[ClusterSecret]) -> Vec<String> {
    cluster_secrets
        .iter()
        .map(|cs| {
            let name = cs.metadata.name.as_deref().unwrap_or("<unknown>");
            let secret_type = cs.spec.template.r#type.as_deref().unwrap_or("Opaque");
            let status = cs.status.clone().unwrap_or_default();
            let ready = status
                .ready_condition()
                .map_or("Unknown", |c| c.status.as_str());
            format!(
                "{name:<30} {:<30} {secret_type:<32} {:<6} {:<11} {ready:<8}",
                cs.secret_name(),
                status.data_count,
                status.ready_secrets_ratio
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_secret_controller::crd::{ClusterSecretSpec, SecretTemplateMetadata};

    #[test]
    fn rows_show_secret_name_type_and_defaults() {
        let mut spec = ClusterSecretSpec::default();
        spec.template.r#type = Some("kubernetes.io/tls".into());
        spec.template.metadata = Some(SecretTemplateMetadata {
            name: Some("tls".into()),
            ..Default::default()
        });
        let rows = rows(&[ClusterSecret::new("certs", spec)]);

        assert_eq!(rows.len(), 1);
        let columns: Vec<&str> = rows[0].split_whitespace().collect();
        assert_eq!(columns, vec!["certs", "tls", "kubernetes.io/tls", "0", "0/0", "Unknown"]);
    }
}
