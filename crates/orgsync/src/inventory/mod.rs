//! Cluster container image inventory and CSV export.

pub mod export;
pub mod kube;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub use export::{write_csv, write_records};
pub use kube::KubeInventory;

/// Registry assumed for images without a registry host.
const DEFAULT_REGISTRY: &str = "docker.io";

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status:?}: {stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to parse {resource} of cluster '{cluster}': {message}")]
    Parse {
        cluster: String,
        resource: String,
        message: String,
    },

    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One running image and who owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerImage {
    pub registry: String,
    pub image_name: String,
    pub container_url: String,
    pub team: Option<String>,
    pub repository: Option<String>,
    pub cluster: String,
}

impl ContainerImage {
    pub fn from_image(
        image: &str,
        team: Option<String>,
        repository: Option<String>,
        cluster: &str,
    ) -> Self {
        let container_url = strip_tag(image.trim()).to_string();
        let registry = match container_url.split_once('/') {
            Some((host, _)) => host.to_string(),
            None => DEFAULT_REGISTRY.to_string(),
        };
        let image_name = container_url
            .rsplit('/')
            .next()
            .unwrap_or(&container_url)
            .to_string();

        Self {
            registry,
            image_name,
            container_url,
            team,
            repository,
            cluster: cluster.to_string(),
        }
    }
}

/// Drops `@digest` and `:tag`; a port in the registry host is kept.
fn strip_tag(image: &str) -> &str {
    let image = image.split_once('@').map(|(name, _)| name).unwrap_or(image);
    let last_segment_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[last_segment_start..].find(':') {
        Some(colon) => &image[..last_segment_start + colon],
        None => image,
    }
}
