use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use resources::{
    config::{ClusterConfig, DeployConfig},
    objects::{pod_template_labels, Labels},
};

use crate::cluster::Cluster;

#[derive(Args)]
pub struct ClusterArgs {
    /// Namespace of the Deployment
    #[clap(short, long)]
    pub namespace: Option<String>,
    /// Path to the kubeconfig file
    #[clap(long, value_name = "FILE")]
    pub kubeconfig: Option<String>,
    /// Kubeconfig context to use
    #[clap(long)]
    pub context: Option<String>,
}

impl ClusterArgs {
    pub fn resolve(&self, config: &ClusterConfig) -> ClusterConfig {
        ClusterConfig {
            kubeconfig: self.kubeconfig.clone().or_else(|| config.kubeconfig.clone()),
            context: self.context.clone().or_else(|| config.context.clone()),
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| config.namespace.clone()),
        }
    }

    /// The flag wins over the manifest, which wins over the configured namespace.
    pub fn namespace_for(&self, manifest: Option<&str>, config: &ClusterConfig) -> String {
        self.namespace
            .as_deref()
            .or(manifest)
            .unwrap_or(config.namespace.as_str())
            .to_string()
    }
}

#[derive(Args)]
pub struct WaitArgs {
    /// Seconds between two pod status polls
    #[clap(long, value_name = "SECS")]
    pub interval: Option<u64>,
    /// Give up waiting after this many seconds
    #[clap(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl WaitArgs {
    /// Poll interval and optional timeout.
    pub fn resolve(&self, config: &DeployConfig) -> Result<(Duration, Option<Duration>)> {
        let config = DeployConfig {
            poll_interval: self.interval.unwrap_or(config.poll_interval),
            timeout: self.timeout.or(config.timeout),
            ..config.clone()
        };
        Ok((config.poll_interval()?, config.timeout()))
    }
}

/// Pod template labels of a Deployment already in the cluster.
pub async fn deployment_labels<C: Cluster>(cluster: &C, name: &str) -> Result<Labels> {
    let deployment = cluster
        .get_deployment(name)
        .await
        .with_context(|| format!("Deployment get error: {}", name))?
        .ok_or_else(|| anyhow!("Deployment {} not found", name))?;
    Ok(pod_template_labels(&deployment))
}
