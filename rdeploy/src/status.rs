use anyhow::{Context, Result};
use chrono::Utc;
use chrono_humanize::{Accuracy, HumanTime, Tense};
use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use resources::objects::pod::{PodPhase, RolloutProgress};

use crate::{
    cluster::{connect, Cluster, KubeCluster},
    utils::{deployment_labels, ClusterArgs},
    CONFIG,
};

#[derive(Args)]
pub struct Arg {
    /// Name of the Deployment
    name: String,
    #[clap(flatten)]
    cluster: ClusterArgs,
}

impl Arg {
    pub async fn handle(&self) -> Result<()> {
        let cluster_config = self.cluster.resolve(&CONFIG.cluster);
        let client = connect(&cluster_config).await?;
        let cluster = KubeCluster::new(client, &cluster_config.namespace);

        let labels = deployment_labels(&cluster, &self.name).await?;
        let selector = labels.selector()?;
        let pods = cluster
            .list_pods(&selector)
            .await
            .with_context(|| format!("Pod list error: {}", selector))?;

        println!("{: <40} {: <10} {: <10}", "NAME", "STATUS", "AGE");
        for pod in &pods {
            println!(
                "{: <40} {: <10} {: <10}",
                pod.metadata.name.as_deref().unwrap_or_default(),
                PodPhase::of(pod),
                age(pod)
            );
        }
        println!("{}", RolloutProgress::from_pods(&pods));
        Ok(())
    }
}

fn age(pod: &Pod) -> String {
    match pod.status.as_ref().and_then(|status| status.start_time.as_ref()) {
        Some(start_time) => HumanTime::from(Utc::now() - start_time.0)
            .to_text_en(Accuracy::Rough, Tense::Present),
        None => "<unknown>".to_string(),
    }
}
