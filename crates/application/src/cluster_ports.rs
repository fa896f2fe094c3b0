use async_trait::async_trait;
use kubegate_core::AppResult;
use kubegate_domain::{ConfigMapSummary, DeploymentSummary, NodeSummary, PodSummary};

/// Port for the cluster data/control client.
///
/// `namespace: None` means all namespaces. Implementations preserve the
/// upstream error category (forbidden / not-found / other) in the error text
/// so the dispatcher can pass it through to the caller.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Probes API reachability.
    async fn ping(&self) -> AppResult<()>;

    /// Lists pods in a namespace, or across all namespaces.
    async fn list_pods(&self, namespace: Option<&str>) -> AppResult<Vec<PodSummary>>;

    /// Fetches one pod by name.
    async fn get_pod(&self, namespace: &str, name: &str) -> AppResult<PodSummary>;

    /// Lists config maps in a namespace, or across all namespaces.
    async fn list_config_maps(&self, namespace: Option<&str>)
    -> AppResult<Vec<ConfigMapSummary>>;

    /// Lists node readiness summaries.
    async fn list_nodes(&self) -> AppResult<Vec<NodeSummary>>;

    /// Lists namespace names.
    async fn list_namespaces(&self) -> AppResult<Vec<String>>;

    /// Fetches one deployment by name.
    async fn get_deployment(&self, namespace: &str, name: &str) -> AppResult<DeploymentSummary>;

    /// Returns the (non-followed) log text of a pod.
    async fn pod_logs(&self, namespace: &str, name: &str) -> AppResult<String>;

    /// Patches a deployment's replica count. The single supported mutation.
    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: u32)
    -> AppResult<()>;
}
