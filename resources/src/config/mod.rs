use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterConfig {
    /// Path to the kubeconfig file.
    /// When unset, the configuration is inferred from `KUBECONFIG`,
    /// `~/.kube/config` or the in-cluster service account.
    pub kubeconfig: Option<String>,
    /// Kubeconfig context to use. Defaults to the current context.
    pub context: Option<String>,
    /// Namespace used when neither the command line
    /// nor the manifest names one.
    pub namespace: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            kubeconfig: None,
            context: None,
            namespace: "default".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    /// Path of the Deployment manifest to apply.
    pub manifest: String,
    /// Interval between two pod status polls.
    /// In seconds. Default: 5 sec
    pub poll_interval: u64,
    /// Give up waiting for pods after this many seconds.
    /// Waits forever if unset.
    pub timeout: Option<u64>,
    pub cluster: ClusterConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            manifest: "deployment.yml".to_string(),
            poll_interval: 5,
            timeout: None,
            cluster: ClusterConfig::default(),
        }
    }
}

impl DeployConfig {
    pub fn poll_interval(&self) -> Result<Duration> {
        if self.poll_interval == 0 {
            return Err(anyhow!("Poll interval must be at least 1 second"));
        }
        Ok(Duration::from_secs(self.poll_interval))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
