use std::{fmt, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Args;
use resources::{
    config::DeployConfig,
    objects::{pod::RolloutProgress, Manifest, Object},
};

use crate::{
    cluster::{connect, Cluster, KubeCluster},
    reconcile::{reconcile, Applied},
    utils::{ClusterArgs, WaitArgs},
    wait::wait_for_pods,
    CONFIG,
};

#[derive(Args)]
pub struct Arg {
    /// The Deployment manifest to apply
    #[clap(short, long, parse(from_os_str), value_name = "FILE")]
    file: Option<PathBuf>,
    /// Return once the Deployment is accepted, without waiting for its pods
    #[clap(long)]
    no_wait: bool,
    #[clap(flatten)]
    cluster: ClusterArgs,
    #[clap(flatten)]
    wait: WaitArgs,
}

impl Arg {
    pub async fn handle(&self) -> Result<()> {
        let path = self
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(&CONFIG.manifest));
        let manifest = Manifest::from_file(&path)?;
        let cluster_config = self.cluster.resolve(&CONFIG.cluster);
        let namespace = self
            .cluster
            .namespace_for(manifest.namespace(), &CONFIG.cluster);
        let wait = self.wait_settings(&CONFIG)?;

        let client = connect(&cluster_config).await?;
        let cluster = KubeCluster::new(client, &namespace);
        let outcome = apply(&cluster, manifest, &namespace, wait)
            .await
            .with_context(|| format!("Failed to apply file {}", path.display()))?;

        println!("{}", outcome);
        Ok(())
    }

    /// Poll interval and timeout, or `None` with `--no-wait`.
    fn wait_settings(&self, config: &DeployConfig) -> Result<Option<(Duration, Option<Duration>)>> {
        if self.no_wait {
            return Ok(None);
        }
        self.wait.resolve(config).map(Some)
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub name: String,
    pub applied: Applied,
    /// Final pod progress, absent when the rollout was not waited for.
    pub progress: Option<RolloutProgress>,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deployment.apps/{} {}", self.name, self.applied.action)?;
        if self.progress.is_some() {
            write!(
                f,
                "\ndeploy succeeded, deployment {} with labels: {}",
                self.name,
                self.applied.labels()
            )?;
        }
        Ok(())
    }
}

/// Submit the manifest into `namespace`, then wait for its pods if asked to.
pub async fn apply<C: Cluster>(
    cluster: &C,
    manifest: Manifest,
    namespace: &str,
    wait: Option<(Duration, Option<Duration>)>,
) -> Result<Outcome> {
    let name = manifest.name().to_owned();
    tracing::info!("Applying {} {} in namespace {}", manifest.kind(), name, namespace);

    let mut deployment = manifest.into_deployment();
    deployment.metadata.namespace = Some(namespace.to_string());
    let applied = reconcile(cluster, deployment).await?;

    let (interval, timeout) = match wait {
        Some(wait) => wait,
        None => {
            return Ok(Outcome {
                name,
                applied,
                progress: None,
            })
        },
    };

    // Pods carry the labels of the stored template, not of the manifest.
    let selector = applied
        .labels()
        .selector()
        .with_context(|| format!("Deployment {} has unusable pod template labels", name))?;
    let progress = wait_for_pods(cluster, &selector, interval, timeout).await?;
    Ok(Outcome {
        name,
        applied,
        progress: Some(progress),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use k8s_openapi::api::core::v1::Pod;
    use serde_json::json;

    use super::*;
    use crate::{cluster::fake::FakeCluster, reconcile::Action};

    const TICK: Duration = Duration::from_millis(1);

    fn manifest(labels: &str) -> Manifest {
        Manifest::from_yaml(&format!(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx
  namespace: web
spec:
  selector:
    matchLabels:
      app: nginx
  template:
    metadata:
      labels: {}
    spec:
      containers:
        - name: nginx
          image: nginx:1.25
"#,
            labels
        ))
        .unwrap()
    }

    fn pod(name: &str, phase: &str) -> Pod {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": name, "labels": { "app": "nginx" } },
            "status": { "phase": phase },
        }))
        .unwrap()
    }

    #[derive(Parser)]
    struct Cli {
        #[clap(flatten)]
        apply: Arg,
    }

    #[tokio::test]
    async fn creates_and_waits_for_pods() {
        let cluster = FakeCluster::with_pods(vec![
            vec![pod("nginx-1", "Pending")],
            vec![pod("nginx-1", "Running")],
        ]);

        let outcome = apply(&cluster, manifest("{ app: nginx }"), "web", Some((TICK, None)))
            .await
            .unwrap();

        assert_eq!(outcome.applied.action, Action::Created);
        assert_eq!(outcome.progress, Some(RolloutProgress { running: 1, total: 1 }));
        assert_eq!(cluster.calls(), vec!["get", "create", "list", "list"]);
        assert_eq!(*cluster.selectors.lock().unwrap(), vec!["app=nginx"; 2]);
        assert_eq!(
            outcome.to_string(),
            "deployment.apps/nginx created\ndeploy succeeded, deployment nginx with labels: app=nginx"
        );
    }

    #[tokio::test]
    async fn resolved_namespace_is_written_into_the_object() {
        let cluster = FakeCluster::default();

        apply(&cluster, manifest("{ app: nginx }"), "staging", None)
            .await
            .unwrap();

        let stored = cluster.stored("nginx").unwrap();
        assert_eq!(stored.metadata.namespace.as_deref(), Some("staging"));
    }

    #[tokio::test]
    async fn no_wait_skips_pod_listing() {
        let cluster = FakeCluster::default();

        let outcome = apply(&cluster, manifest("{ app: nginx }"), "web", None)
            .await
            .unwrap();

        assert_eq!(outcome.progress, None);
        assert_eq!(cluster.calls(), vec!["get", "create"]);
        assert_eq!(outcome.to_string(), "deployment.apps/nginx created");
    }

    #[tokio::test]
    async fn unlabeled_template_fails_before_waiting() {
        let cluster = FakeCluster::default();

        let err = apply(&cluster, manifest("{}"), "web", Some((TICK, None)))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Deployment nginx has unusable pod template labels"
        );
        assert_eq!(cluster.calls(), vec!["get", "create"]);
    }

    #[test]
    fn no_wait_ignores_wait_settings() {
        let cli = Cli::parse_from(["rdeploy", "--no-wait", "--interval", "0"]);
        assert_eq!(cli.apply.wait_settings(&DeployConfig::default()).unwrap(), None);

        let cli = Cli::parse_from(["rdeploy", "--interval", "0"]);
        assert!(cli.apply.wait_settings(&DeployConfig::default()).is_err());

        let cli = Cli::parse_from(["rdeploy", "--timeout", "30"]);
        assert_eq!(
            cli.apply.wait_settings(&DeployConfig::default()).unwrap(),
            Some((Duration::from_secs(5), Some(Duration::from_secs(30))))
        );
    }
}
