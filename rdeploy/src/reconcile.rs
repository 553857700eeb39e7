use anyhow::{anyhow, Context, Result};
use k8s_openapi::api::apps::v1::Deployment;
use resources::objects::{pod_template_labels, Labels};
use strum::Display;

use crate::cluster::{is_conflict, Cluster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Created,
    Updated,
}

#[derive(Debug)]
pub struct Applied {
    pub action: Action,
    /// The Deployment as stored by the API server.
    pub deployment: Deployment,
}

impl Applied {
    pub fn labels(&self) -> Labels {
        pod_template_labels(&self.deployment)
    }
}

/// Create the Deployment, or update it if one with the same name exists.
pub async fn reconcile<C: Cluster>(cluster: &C, desired: Deployment) -> Result<Applied> {
    let name = desired
        .metadata
        .name
        .clone()
        .ok_or_else(|| anyhow!("Deployment has no name"))?;

    let live = cluster
        .get_deployment(&name)
        .await
        .with_context(|| format!("Deployment get error: {}", name))?;
    if let Some(live) = live {
        tracing::debug!(
            "Deployment {} exists at version {}",
            name,
            live.metadata.resource_version.as_deref().unwrap_or("<none>")
        );
        return update(cluster, &name, desired, live.metadata.resource_version).await;
    }

    match cluster.create_deployment(&desired).await {
        Ok(deployment) => {
            tracing::info!("Created Deployment {}", name);
            Ok(Applied {
                action: Action::Created,
                deployment,
            })
        },
        Err(e) if is_conflict(&e) => {
            tracing::info!("Deployment {} was created concurrently, updating it", name);
            update(cluster, &name, desired, None).await
        },
        Err(e) => Err(e).with_context(|| format!("Deployment create error: {}", name)),
    }
}

async fn update<C: Cluster>(
    cluster: &C,
    name: &str,
    mut desired: Deployment,
    resource_version: Option<String>,
) -> Result<Applied> {
    desired.metadata.resource_version = resource_version;
    let deployment = cluster
        .replace_deployment(name, &desired)
        .await
        .with_context(|| format!("Deployment update error: {}", name))?;
    tracing::info!("Updated Deployment {}", name);
    Ok(Applied {
        action: Action::Updated,
        deployment,
    })
}
