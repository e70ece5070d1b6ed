//! # Validate Command
//!
//! Offline defaulting and validation of ClusterSecret manifests.

use anyhow::{Context, Result};
use cluster_secret_controller::controller::admission::{default_cluster_secret, validate_spec};
use cluster_secret_controller::crd::ClusterSecret;
use serde::Deserialize;
use std::path::Path;

/// Outcome for one YAML document
#[derive(Debug)]
pub struct ManifestReport {
    /// Zero-based document index within the file
    pub index: usize,
    pub name: Option<String>,
    /// Defaulted resource, when it decoded
    pub defaulted: Option<ClusterSecret>,
    pub error: Option<String>,
}

/// Decode, default and validate every document of a YAML stream
pub fn validate_manifests(content: &str) -> Vec<ManifestReport> {
    serde_yaml::Deserializer::from_str(content)
        .enumerate()
        .map(|(index, document)| match ClusterSecret::deserialize(document) {
            Ok(mut cs) => {
                default_cluster_secret(&mut cs);
                let error = validate_spec(&cs.spec).err().map(|e| e.to_string());
                ManifestReport {
                    index,
                    name: cs.metadata.name.clone(),
                    defaulted: Some(cs),
                    error,
                }
            }
            Err(e) => ManifestReport {
                index,
                name: None,
                defaulted: None,
                error: Some(format!("not a valid ClusterSecret: {e}")),
            },
        })
        .collect()
}

/// Validate a manifest file, failing if any document is invalid
pub fn validate_command(path: &Path, print: bool) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let reports = validate_manifests(&content);

    let mut failures = 0;
    for report in &reports {
        let name = report.name.as_deref().unwrap_or("<unnamed>");
        match &report.error {
            None => println!("document {} ({name}): valid", report.index),
            Some(error) => {
                failures += 1;
                println!("document {} ({name}): {error}", report.index);
            }
        }
        if print {
            if let Some(cs) = &report.defaulted {
                println!("---");
                print!("{}", serde_yaml::to_string(cs)?);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} documents are invalid", reports.len());
    }
    Ok(())
}
