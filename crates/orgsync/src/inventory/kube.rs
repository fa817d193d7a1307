//! Container images running in Kubernetes clusters, read through kubectl.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use tokio::process::Command;

use super::{ContainerImage, InventoryError};

const TEAM_LABEL: &str = "team";
const REPOSITORY_LABEL: &str = "git_repository";
const CHART_LABEL: &str = "chart";

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct Container {
    image: String,
}

#[derive(Debug, Default, Deserialize)]
struct PodSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    spec: PodSpec,
}

#[derive(Debug, Default, Deserialize)]
struct PodTemplate {
    #[serde(default)]
    spec: PodSpec,
}

#[derive(Debug, Default, Deserialize)]
struct JobSpec {
    #[serde(default)]
    template: PodTemplate,
}

#[derive(Debug, Default, Deserialize)]
struct JobTemplate {
    #[serde(default)]
    spec: JobSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CronJobSpec {
    #[serde(default)]
    job_template: JobTemplate,
}

#[derive(Debug, Deserialize)]
struct CronJob {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    spec: CronJobSpec,
}

impl Metadata {
    fn label(&self, key: &str) -> Option<String> {
        self.labels
            .as_ref()
            .and_then(|l| l.get(key))
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn team(&self) -> Option<String> {
        self.label(TEAM_LABEL)
    }

    fn repository(&self) -> Option<String> {
        self.label(REPOSITORY_LABEL)
    }

    /// Pods deployed by a chart often carry only the chart label.
    fn repository_or_chart(&self) -> Option<String> {
        self.repository().or_else(|| self.label(CHART_LABEL))
    }
}

/// Crawls the configured kube contexts.
#[derive(Debug, Clone)]
pub struct KubeInventory {
    kubectl: String,
    contexts: Vec<String>,
}

impl KubeInventory {
    pub fn new(kubectl: impl Into<String>, contexts: Vec<String>) -> Self {
        Self {
            kubectl: kubectl.into(),
            contexts,
        }
    }

    /// Images from every context, deduplicated. A failing context is logged
    /// and skipped.
    pub async fn collect(&self) -> Vec<ContainerImage> {
        let mut images = Vec::new();
        let mut seen = HashSet::new();

        for context in &self.contexts {
            match self.collect_context(context).await {
                Ok(found) => {
                    for image in found {
                        if seen.insert(image.clone()) {
                            log::info!("+ {} ({})", image.image_name, context);
                            images.push(image);
                        }
                    }
                }
                Err(e) => log::error!("Skipping cluster '{}': {}", context, e),
            }
        }

        log::info!("Results: {} images found", images.len());
        images
    }

    /// Images from cron jobs and pods of one context.
    pub async fn collect_context(&self, context: &str) -> Result<Vec<ContainerImage>, InventoryError> {
        log::info!("Cluster: {}", context);

        let cronjobs = self.kubectl_json("cronjobs", context).await?;
        let mut images = images_from_cronjobs(&cronjobs, context)?;

        let pods = self.kubectl_json("pods", context).await?;
        images.extend(images_from_pods(&pods, context)?);

        Ok(images)
    }

    async fn kubectl_json(&self, resource: &str, context: &str) -> Result<Vec<u8>, InventoryError> {
        let args = ["get", resource, "-A", "-o", "json", "--context", context];
        let command = format!("{} {}", self.kubectl, args.join(" "));

        let output = Command::new(&self.kubectl)
            .args(args)
            .output()
            .await
            .map_err(|e| InventoryError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(InventoryError::CommandFailed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Every container of every cron job.
pub fn images_from_cronjobs(json: &[u8], cluster: &str) -> Result<Vec<ContainerImage>, InventoryError> {
    let list: ObjectList<CronJob> = parse(json, cluster, "cronjobs")?;
    Ok(list
        .items
        .iter()
        .flat_map(|job| {
            let team = job.metadata.team();
            let repository = job.metadata.repository();
            job.spec
                .job_template
                .spec
                .template
                .spec
                .containers
                .iter()
                .map(move |c| {
                    ContainerImage::from_image(&c.image, team.clone(), repository.clone(), cluster)
                })
        })
        .collect())
}

/// The main (first) container of every pod; sidecars are not inventoried.
pub fn images_from_pods(json: &[u8], cluster: &str) -> Result<Vec<ContainerImage>, InventoryError> {
    let list: ObjectList<Pod> = parse(json, cluster, "pods")?;
    Ok(list
        .items
        .iter()
        .filter_map(|pod| {
            let container = pod.spec.containers.first()?;
            Some(ContainerImage::from_image(
                &container.image,
                pod.metadata.team(),
                pod.metadata.repository_or_chart(),
                cluster,
            ))
        })
        .collect())
}

fn parse<T: serde::de::DeserializeOwned>(
    json: &[u8],
    cluster: &str,
    resource: &str,
) -> Result<T, InventoryError> {
    serde_json::from_slice(json).map_err(|e| InventoryError::Parse {
        cluster: cluster.to_string(),
        resource: resource.to_string(),
        message: e.to_string(),
    })
}
