use anyhow::{Context, Result};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use kube::{
    api::{ListParams, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config,
};
use resources::config::ClusterConfig;

/// The handful of control plane calls a rollout needs,
/// scoped to a single namespace.
pub trait Cluster {
    async fn get_deployment(&self, name: &str) -> kube::Result<Option<Deployment>>;

    async fn create_deployment(&self, deployment: &Deployment) -> kube::Result<Deployment>;

    async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> kube::Result<Deployment>;

    async fn list_pods(&self, selector: &str) -> kube::Result<Vec<Pod>>;
}

pub struct KubeCluster {
    deployments: Api<Deployment>,
    pods: Api<Pod>,
}

impl KubeCluster {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            deployments: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
        }
    }
}

impl Cluster for KubeCluster {
    async fn get_deployment(&self, name: &str) -> kube::Result<Option<Deployment>> {
        self.deployments.get_opt(name).await
    }

    async fn create_deployment(&self, deployment: &Deployment) -> kube::Result<Deployment> {
        self.deployments
            .create(&PostParams::default(), deployment)
            .await
    }

    async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> kube::Result<Deployment> {
        self.deployments
            .replace(name, &PostParams::default(), deployment)
            .await
    }

    async fn list_pods(&self, selector: &str) -> kube::Result<Vec<Pod>> {
        let params = ListParams::default().labels(selector);
        Ok(self.pods.list(&params).await?.items)
    }
}

/// Build a client from the configured kubeconfig,
/// falling back to the usual discovery rules when none is given.
pub async fn connect(cluster: &ClusterConfig) -> Result<Client> {
    let options = KubeConfigOptions {
        context: cluster.context.clone(),
        ..Default::default()
    };
    let config = match (&cluster.kubeconfig, &cluster.context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path))?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .with_context(|| format!("Failed to load kubeconfig {}", path))?
        },
        (None, Some(context)) => Config::from_kubeconfig(&options)
            .await
            .with_context(|| format!("Failed to load kubeconfig context {}", context))?,
        (None, None) => Config::infer()
            .await
            .context("Failed to infer cluster config")?,
    };
    tracing::debug!("Connecting to {}", config.cluster_url);
    Client::try_from(config).context("Error with k8s client")
}

/// The object already exists, or changed since it was read.
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 409)
}
