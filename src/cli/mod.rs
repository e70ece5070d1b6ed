//! # CSECCTL CLI
//!
//! Command-line interface for the ClusterSecret controller.
//!
//! ## Usage
//!
//! ```bash
//! # List all ClusterSecret resources
//! csecctl list
//!
//! # Show status of a ClusterSecret
//! csecctl status registry-credentials
//!
//! # Evaluate a ClusterSecret's selector against the live namespaces
//! csecctl match registry-credentials --show-avoided
//!
//! # Default and validate manifests offline
//! csecctl validate clustersecrets.yaml --print
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::PathBuf;

mod list;
mod matching;
mod status;
mod validate;

/// ClusterSecret controller CLI
#[derive(Parser)]
#[command(name = "csecctl")]
#[command(
    about = "ClusterSecret controller CLI",
    long_about = None,
    after_help = "\
Examples:
  csecctl list
  csecctl status registry-credentials
  csecctl match registry-credentials --show-avoided
  csecctl validate clustersecret.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes context to use
    #[arg(short, long, global = true)]
    context: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all ClusterSecret resources
    List,
    /// Show status of a ClusterSecret resource
    Status {
        /// Name of the ClusterSecret resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Evaluate a ClusterSecret's selector against the namespaces in the cluster
    Match {
        /// Name of the ClusterSecret resource
        #[arg(value_name = "NAME")]
        name: String,

        /// Also list the namespaces the selector rejects
        #[arg(long)]
        show_avoided: bool,
    },
    /// Default and validate ClusterSecret manifests without a cluster
    Validate {
        /// YAML file, possibly holding several documents
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the defaulted manifests
        #[arg(long)]
        print: bool,
    },
}

async fn client(context: Option<String>) -> Result<Client> {
    let config = match context {
        Some(context) => {
            let kubeconfig = Kubeconfig::read().context("Failed to read kubeconfig")?;
            let options = KubeConfigOptions {
                context: Some(context),
                ..KubeConfigOptions::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .context("Failed to load kubeconfig context")?
        }
        None => Config::infer().await.context("Failed to infer Kubernetes config")?,
    };
    Client::try_from(config)
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")
}

#[tokio::main]
async fn main() -> Result<()> {
    // an already installed provider is fine
    let _ = rustls::crypto::ring::default_provider().install_default();

    cluster_secret_controller::observability::init_tracing("csecctl=info");

    let cli = Cli::parse();

    match cli.command {
        Commands::List => list::list_command(client(cli.context).await?).await,
        Commands::Status { name } => status::status_command(client(cli.context).await?, &name).await,
        Commands::Match { name, show_avoided } => {
            matching::match_command(client(cli.context).await?, &name, show_avoided).await
        }
        Commands::Validate { file, print } => validate::validate_command(&file, print),
    }
}
