//! Read-model summaries of cluster resources.
//!
//! Deliberately coarse: only the fields the dispatcher and dashboards
//! actually render. Full cluster state is never reconstructed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-container status within a pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    /// Container name.
    pub name: String,
    /// Whether the container passed its readiness check.
    pub ready: bool,
    /// Restart count.
    pub restart_count: u32,
    /// Waiting-state reason (e.g. `CrashLoopBackOff`), if any.
    pub waiting_reason: Option<String>,
}

/// Coarse pod summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSummary {
    /// Pod name.
    pub name: String,
    /// Namespace the pod lives in.
    pub namespace: String,
    /// Lifecycle phase (`Pending`, `Running`, ...).
    pub phase: String,
    /// Container statuses, in declaration order.
    pub containers: Vec<ContainerStatus>,
    /// Pod labels.
    pub labels: BTreeMap<String, String>,
    /// Node the pod was scheduled onto.
    pub node_name: Option<String>,
    /// When the pod started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the pod object was created.
    pub created_at: Option<DateTime<Utc>>,
}

impl PodSummary {
    /// Number of containers currently ready.
    #[must_use]
    pub fn ready_containers(&self) -> usize {
        self.containers.iter().filter(|status| status.ready).count()
    }

    /// Restart count of the first container, zero when there are none.
    #[must_use]
    pub fn first_container_restarts(&self) -> u32 {
        self.containers
            .first()
            .map(|status| status.restart_count)
            .unwrap_or_default()
    }
}

/// Coarse config map summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapSummary {
    /// Config map name.
    pub name: String,
    /// Namespace the config map lives in.
    pub namespace: String,
    /// When the config map was created.
    pub created_at: Option<DateTime<Utc>>,
}

/// Node readiness summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Node name.
    pub name: String,
    /// Whether the node reports the `Ready` condition as true.
    pub ready: bool,
}

/// Coarse deployment summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    /// Deployment name.
    pub name: String,
    /// Namespace the deployment lives in.
    pub namespace: String,
    /// Desired replica count.
    pub desired_replicas: i32,
    /// Updated replica count.
    pub updated_replicas: i32,
    /// Available replica count.
    pub available_replicas: i32,
    /// Label selector, as `key=value` match labels.
    pub selector: BTreeMap<String, String>,
}

impl DeploymentSummary {
    /// Renders the selector as `key=value` pairs joined with commas.
    #[must_use]
    pub fn selector_string(&self) -> String {
        self.selector
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ContainerStatus, DeploymentSummary, PodSummary};

    #[test]
    fn pod_ready_counts_reflect_container_statuses() {
        let pod = PodSummary {
            name: "frontend".to_owned(),
            namespace: "default".to_owned(),
            phase: "Running".to_owned(),
            containers: vec![
                ContainerStatus {
                    name: "app".to_owned(),
                    ready: true,
                    restart_count: 3,
                    waiting_reason: None,
                },
                ContainerStatus {
                    name: "sidecar".to_owned(),
                    ready: false,
                    restart_count: 0,
                    waiting_reason: None,
                },
            ],
            labels: BTreeMap::new(),
            node_name: None,
            started_at: None,
            created_at: None,
        };

        assert_eq!(pod.ready_containers(), 1);
        assert_eq!(pod.first_container_restarts(), 3);
    }

    #[test]
    fn deployment_selector_renders_sorted_pairs() {
        let deployment = DeploymentSummary {
            name: "frontend".to_owned(),
            namespace: "default".to_owned(),
            desired_replicas: 3,
            updated_replicas: 3,
            available_replicas: 2,
            selector: BTreeMap::from([
                ("app".to_owned(), "frontend".to_owned()),
                ("tier".to_owned(), "web".to_owned()),
            ]),
        };

        assert_eq!(deployment.selector_string(), "app=frontend,tier=web");
    }
}
