use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use k8s_openapi::{api::apps::v1::Deployment, Resource};
use serde::Deserialize;

pub mod labels;
pub mod pod;

pub use labels::Labels;

pub trait Object {
    fn kind(&self) -> &'static str;

    fn name(&self) -> &str;

    fn namespace(&self) -> Option<&str>;
}

/// Type information every manifest carries,
/// read before the object itself is decoded.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TypeMeta {
    api_version: String,
    kind: String,
}

/// A workload definition loaded from disk.
#[derive(Debug, Clone)]
pub enum Manifest {
    Deployment(Box<Deployment>),
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let type_meta: TypeMeta =
            serde_yaml::from_str(content).context("Failed to read object type")?;
        if type_meta.api_version == Deployment::API_VERSION && type_meta.kind == Deployment::KIND {
            let deployment: Deployment =
                serde_yaml::from_str(content).context("Failed to decode Deployment")?;
            if deployment.metadata.name.as_deref().unwrap_or_default().is_empty() {
                return Err(anyhow!("Deployment has no metadata.name"));
            }
            return Ok(Manifest::Deployment(Box::new(deployment)));
        }
        Err(anyhow!(
            "unrecognized type: {}, Kind={}",
            type_meta.api_version,
            type_meta.kind
        ))
    }

    pub fn deployment(&self) -> &Deployment {
        match self {
            Manifest::Deployment(deployment) => deployment,
        }
    }

    pub fn into_deployment(self) -> Deployment {
        match self {
            Manifest::Deployment(deployment) => *deployment,
        }
    }
}

impl Object for Manifest {
    fn kind(&self) -> &'static str {
        match self {
            Manifest::Deployment(_) => Deployment::KIND,
        }
    }

    fn name(&self) -> &str {
        self.deployment()
            .metadata
            .name
            .as_deref()
            .unwrap_or_default()
    }

    fn namespace(&self) -> Option<&str> {
        self.deployment().metadata.namespace.as_deref()
    }
}

/// Labels stamped on every pod a Deployment creates.
pub fn pod_template_labels(deployment: &Deployment) -> Labels {
    let labels = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.template.metadata.as_ref())
        .and_then(|metadata| metadata.labels.as_ref());
    Labels::from(labels)
}
