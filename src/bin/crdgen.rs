//! # CRD Generator
//!
//! Prints the `ClusterSecret` CustomResourceDefinition as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/clustersecret.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use cluster_secret_controller::crd::ClusterSecret;
use kube::core::CustomResourceExt;

fn main() {
    match serde_yaml::to_string(&ClusterSecret::crd()) {
        Ok(yaml) => {
            println!("# This file is auto-generated by crdgen");
            println!("# DO NOT EDIT THIS FILE MANUALLY");
            println!("---");
            print!("{yaml}");
        }
        Err(e) => {
            eprintln!("Failed to serialize CRD to YAML: {e}");
            std::process::exit(1);
        }
    }
}
