use std::{fmt, str::FromStr};

use k8s_openapi::api::core::v1::Pod;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum PodPhase {
    /// The pod has been accepted by the Kubernetes system,
    /// but one or more of the container images has not been created.
    /// This includes time before being scheduled
    /// as well as time spent downloading images over the network.
    Pending,
    /// The pod has been bound to a node,
    /// and all of the containers have been created.
    /// At least one container is still running,
    /// or is in the process of starting or restarting.
    Running,
    /// All containers in the pod have terminated in success,
    /// and will not be restarted.
    Succeeded,
    /// All containers in the pod have terminated,
    /// and at least one container has terminated in failure.
    Failed,
    /// The state of the pod could not be obtained,
    /// typically due to an error in communicating with the host of the pod.
    Unknown,
}

impl PodPhase {
    pub fn of(pod: &Pod) -> Self {
        pod.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .and_then(|phase| PodPhase::from_str(phase).ok())
            .unwrap_or(PodPhase::Unknown)
    }
}

/// How many of the selected pods are running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RolloutProgress {
    pub running: usize,
    pub total: usize,
}

impl RolloutProgress {
    pub fn from_pods(pods: &[Pod]) -> Self {
        let running = pods
            .iter()
            .filter(|pod| PodPhase::of(pod) == PodPhase::Running)
            .count();
        RolloutProgress {
            running,
            total: pods.len(),
        }
    }

    /// At least one pod exists and all of them are running.
    pub fn is_complete(&self) -> bool {
        self.running > 0 && self.running == self.total
    }
}

impl fmt::Display for RolloutProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "running {}/{}", self.running, self.total)
    }
}
