use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use resources::objects::pod::RolloutProgress;
use tokio::time::{sleep, Instant};

use crate::{
    cluster::{connect, Cluster, KubeCluster},
    utils::{deployment_labels, ClusterArgs, WaitArgs},
    CONFIG,
};

#[derive(Args)]
pub struct Arg {
    /// Name of the Deployment
    name: String,
    #[clap(flatten)]
    cluster: ClusterArgs,
    #[clap(flatten)]
    wait: WaitArgs,
}

impl Arg {
    pub async fn handle(&self) -> Result<()> {
        let cluster_config = self.cluster.resolve(&CONFIG.cluster);
        let (interval, timeout) = self.wait.resolve(&CONFIG)?;
        let client = connect(&cluster_config).await?;
        let cluster = KubeCluster::new(client, &cluster_config.namespace);

        let labels = deployment_labels(&cluster, &self.name).await?;
        let selector = labels.selector()?;
        wait_for_pods(&cluster, &selector, interval, timeout).await?;

        println!("deployment {} is running, labels: {}", self.name, labels);
        Ok(())
    }
}

/// Poll the pods matching `selector` every `interval`
/// until at least one exists and all of them are running.
pub async fn wait_for_pods<C: Cluster>(
    cluster: &C,
    selector: &str,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<RolloutProgress> {
    let started = Instant::now();
    loop {
        let pods = cluster
            .list_pods(selector)
            .await
            .with_context(|| format!("Pod list error: {}", selector))?;
        let progress = RolloutProgress::from_pods(&pods);
        tracing::info!("Waiting for pods to become ready ({})", progress);
        if progress.is_complete() {
            return Ok(progress);
        }

        match timeout {
            Some(timeout) => {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(anyhow!(
                        "Timed out after {}s waiting for pods {} ({})",
                        timeout.as_secs(),
                        selector,
                        progress
                    ));
                }
                sleep(interval.min(timeout - elapsed)).await;
            },
            None => sleep(interval).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Pod;
    use serde_json::json;

    use super::*;
    use crate::cluster::fake::FakeCluster;

    const TICK: Duration = Duration::from_millis(1);

    fn pod(name: &str, phase: &str) -> Pod {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "labels": { "app": "nginx" } },
            "status": { "phase": phase },
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn returns_once_all_pods_run() {
        let cluster = FakeCluster::with_pods(vec![
            vec![],
            vec![pod("a", "Pending"), pod("b", "Pending")],
            vec![pod("a", "Running"), pod("b", "Pending")],
            vec![pod("a", "Running"), pod("b", "Running")],
        ]);

        let progress = wait_for_pods(&cluster, "app=nginx", TICK, None)
            .await
            .unwrap();

        assert_eq!(progress, RolloutProgress { running: 2, total: 2 });
        assert_eq!(cluster.calls(), vec!["list"; 4]);
        assert!(cluster
            .selectors
            .lock()
            .unwrap()
            .iter()
            .all(|s| s == "app=nginx"));
    }

    #[tokio::test]
    async fn already_running() {
        let cluster = FakeCluster::with_pods(vec![vec![pod("a", "Running")]]);

        let progress = wait_for_pods(&cluster, "app=nginx", TICK, None)
            .await
            .unwrap();

        assert_eq!(progress.to_string(), "running 1/1");
        assert_eq!(cluster.calls().len(), 1);
    }

    #[tokio::test]
    async fn times_out_with_last_progress() {
        let cluster = FakeCluster::with_pods(vec![vec![pod("a", "Running"), pod("b", "Failed")]]);

        let err = wait_for_pods(&cluster, "app=nginx", TICK, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("running 1/2"), "{}", err);
        assert!(cluster.calls().len() > 1);
    }

    #[tokio::test]
    async fn zero_timeout_polls_once() {
        let cluster = FakeCluster::with_pods(vec![vec![]]);

        let err = wait_for_pods(&cluster, "app=nginx", TICK, Some(Duration::ZERO))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("running 0/0"), "{}", err);
        assert_eq!(cluster.calls().len(), 1);
    }

    #[tokio::test]
    async fn list_error_aborts() {
        let cluster = FakeCluster {
            unavailable: true,
            ..Default::default()
        };

        let err = wait_for_pods(&cluster, "app=nginx", TICK, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Pod list error: app=nginx");
    }
}
