//! Kubernetes API adapter over plain HTTPS.
//!
//! Talks to the API server's REST surface directly (pods, configmaps, nodes,
//! deployments, logs, `SelfSubjectAccessReview`) and converts the wire shapes
//! into the domain's coarse summaries.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kubegate_application::{AccessDecision, AccessRequest, ClusterClient, PermissionAuthority};
use kubegate_core::{AppError, AppResult};
use kubegate_domain::{
    ConfigMapSummary, ContainerStatus, DeploymentSummary, NodeSummary, PodSummary,
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Connection settings for the API server.
#[derive(Debug, Clone)]
pub struct KubeApiConfig {
    /// API server base URL, e.g. `https://10.0.0.1:6443`.
    pub base_url: String,
    /// Service-account bearer token, if the server requires one.
    pub bearer_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (self-signed dev clusters only).
    pub accept_invalid_certs: bool,
}

/// [`ClusterClient`] and [`PermissionAuthority`] backed by the API server.
pub struct KubeHttpClient {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl KubeHttpClient {
    /// Builds a client from connection settings.
    pub fn new(config: KubeApiConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build Kubernetes HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            bearer_token: config.bearer_token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http_client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get_json<T>(&self, path: &str, context: &str) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(|error| transport_error(context, &error))?;
        let response = ensure_success(response, context).await?;
        response.json::<T>().await.map_err(|error| {
            AppError::Internal(format!("malformed API response for {context}: {error}"))
        })
    }
}

async fn ensure_success(
    response: reqwest::Response,
    context: &str,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());

    match status {
        reqwest::StatusCode::FORBIDDEN => Err(AppError::Execution(format!(
            "Error from server (Forbidden): {context}"
        ))),
        reqwest::StatusCode::NOT_FOUND => Err(AppError::NotFound(format!(
            "Error from server (NotFound): {context}"
        ))),
        reqwest::StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(format!(
            "API server rejected credentials for {context}"
        ))),
        _ => Err(AppError::Internal(format!(
            "API server returned {status} for {context}: {body}"
        ))),
    }
}

fn transport_error(context: &str, error: &reqwest::Error) -> AppError {
    AppError::Internal(format!("API request for {context} failed: {error}"))
}

fn pods_path(namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("/api/v1/namespaces/{namespace}/pods"),
        None => "/api/v1/pods".to_owned(),
    }
}

fn config_maps_path(namespace: Option<&str>) -> String {
    match namespace {
        Some(namespace) => format!("/api/v1/namespaces/{namespace}/configmaps"),
        None => "/api/v1/configmaps".to_owned(),
    }
}

#[async_trait]
impl ClusterClient for KubeHttpClient {
    async fn ping(&self) -> AppResult<()> {
        let response = self
            .request(reqwest::Method::GET, "/version")
            .send()
            .await
            .map_err(|error| transport_error("version probe", &error))?;
        ensure_success(response, "version probe").await.map(|_| ())
    }

    async fn list_pods(&self, namespace: Option<&str>) -> AppResult<Vec<PodSummary>> {
        let list: ObjectList<PodWire> = self.get_json(&pods_path(namespace), "pods").await?;
        Ok(list.items.into_iter().map(PodWire::into_summary).collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> AppResult<PodSummary> {
        let path = format!("/api/v1/namespaces/{namespace}/pods/{name}");
        let pod: PodWire = self
            .get_json(&path, &format!("pods \"{name}\""))
            .await?;
        Ok(pod.into_summary())
    }

    async fn list_config_maps(&self, namespace: Option<&str>) -> AppResult<Vec<ConfigMapSummary>> {
        let list: ObjectList<ConfigMapWire> = self
            .get_json(&config_maps_path(namespace), "configmaps")
            .await?;
        Ok(list
            .items
            .into_iter()
            .map(|item| ConfigMapSummary {
                name: item.metadata.name,
                namespace: item.metadata.namespace,
                created_at: item.metadata.creation_timestamp,
            })
            .collect())
    }

    async fn list_nodes(&self) -> AppResult<Vec<NodeSummary>> {
        let list: ObjectList<NodeWire> = self.get_json("/api/v1/nodes", "nodes").await?;
        Ok(list
            .items
            .into_iter()
            .map(|node| NodeSummary {
                ready: node.is_ready(),
                name: node.metadata.name,
            })
            .collect())
    }

    async fn list_namespaces(&self) -> AppResult<Vec<String>> {
        let list: ObjectList<NamespaceWire> =
            self.get_json("/api/v1/namespaces", "namespaces").await?;
        Ok(list.items.into_iter().map(|item| item.metadata.name).collect())
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> AppResult<DeploymentSummary> {
        let path = format!("/apis/apps/v1/namespaces/{namespace}/deployments/{name}");
        let deployment: DeploymentWire = self
            .get_json(&path, &format!("deployments.apps \"{name}\""))
            .await?;
        Ok(deployment.into_summary())
    }

    async fn pod_logs(&self, namespace: &str, name: &str) -> AppResult<String> {
        let path = format!("/api/v1/namespaces/{namespace}/pods/{name}/log");
        let context = format!("pods \"{name}\" logs");
        let response = self
            .request(reqwest::Method::GET, &path)
            .send()
            .await
            .map_err(|error| transport_error(&context, &error))?;
        let response = ensure_success(response, &context).await?;
        response
            .text()
            .await
            .map_err(|error| transport_error(&context, &error))
    }

    async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: u32,
    ) -> AppResult<()> {
        let path = format!("/apis/apps/v1/namespaces/{namespace}/deployments/{name}");
        let context = format!("deployments.apps \"{name}\"");
        // The body sets the content type; `.json()` would reset it to plain
        // application/json, which the API server rejects for merge patches.
        let patch = json!({ "spec": { "replicas": replicas } }).to_string();
        let response = self
            .request(reqwest::Method::PATCH, &path)
            .header(reqwest::header::CONTENT_TYPE, "application/merge-patch+json")
            .body(patch)
            .send()
            .await
            .map_err(|error| transport_error(&context, &error))?;
        ensure_success(response, &context).await.map(|_| ())
    }
}

#[async_trait]
impl PermissionAuthority for KubeHttpClient {
    async fn check(&self, request: &AccessRequest) -> AppResult<AccessDecision> {
        let body = build_access_review(request);
        let response = self
            .request(
                reqwest::Method::POST,
                "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews",
            )
            .json(&body)
            .send()
            .await
            .map_err(|error| transport_error("access review", &error))?;
        let response = ensure_success(response, "access review").await?;

        let review: AccessReviewWire = response.json().await.map_err(|error| {
            AppError::Internal(format!("malformed access review response: {error}"))
        })?;
        let status = review.status.unwrap_or_default();
        Ok(AccessDecision {
            allowed: status.allowed,
            reason: status.reason.unwrap_or_default(),
        })
    }
}

/// Builds a `SelfSubjectAccessReview` body for the gateway tuple.
///
/// Gateway verbs collapse onto RBAC verbs: `describe` and `logs` read, `scale`
/// patches. Resource aliases collapse onto the canonical plural.
fn build_access_review(request: &AccessRequest) -> Value {
    json!({
        "apiVersion": "authorization.k8s.io/v1",
        "kind": "SelfSubjectAccessReview",
        "spec": {
            "resourceAttributes": {
                "namespace": request.namespace,
                "verb": rbac_verb(&request.verb),
                "resource": canonical_resource(&request.resource),
                "name": request.name,
            }
        }
    })
}

fn rbac_verb(verb: &str) -> &str {
    match verb {
        "describe" | "logs" => "get",
        "scale" => "patch",
        other => other,
    }
}

fn canonical_resource(resource: &str) -> &str {
    match resource {
        "pod" | "po" => "pods",
        "configmap" | "cm" => "configmaps",
        "deployment" | "deploy" => "deployments",
        "node" | "no" => "nodes",
        "namespace" | "ns" => "namespaces",
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PodWire {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: PodSpecWire,
    #[serde(default)]
    status: PodStatusWire,
}

impl PodWire {
    fn into_summary(self) -> PodSummary {
        PodSummary {
            name: self.metadata.name,
            namespace: self.metadata.namespace,
            phase: self.status.phase.unwrap_or_else(|| "Unknown".to_owned()),
            containers: self
                .status
                .container_statuses
                .into_iter()
                .map(|status| ContainerStatus {
                    name: status.name,
                    ready: status.ready,
                    restart_count: status.restart_count,
                    waiting_reason: status
                        .state
                        .and_then(|state| state.waiting)
                        .and_then(|waiting| waiting.reason),
                })
                .collect(),
            labels: self.metadata.labels,
            node_name: self.spec.node_name,
            started_at: self.status.start_time,
            created_at: self.metadata.creation_timestamp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpecWire {
    node_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodStatusWire {
    phase: Option<String>,
    #[serde(default)]
    container_statuses: Vec<ContainerStatusWire>,
    start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerStatusWire {
    name: String,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    restart_count: u32,
    state: Option<ContainerStateWire>,
}

#[derive(Debug, Deserialize)]
struct ContainerStateWire {
    waiting: Option<ContainerWaitingWire>,
}

#[derive(Debug, Deserialize)]
struct ContainerWaitingWire {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigMapWire {
    #[serde(default)]
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct NamespaceWire {
    #[serde(default)]
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct NodeWire {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    status: NodeStatusWire,
}

impl NodeWire {
    fn is_ready(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|condition| condition.condition_type == "Ready" && condition.status == "True")
    }
}

#[derive(Debug, Default, Deserialize)]
struct NodeStatusWire {
    #[serde(default)]
    conditions: Vec<NodeConditionWire>,
}

#[derive(Debug, Deserialize)]
struct NodeConditionWire {
    #[serde(rename = "type")]
    condition_type: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct DeploymentWire {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    spec: DeploymentSpecWire,
    #[serde(default)]
    status: DeploymentStatusWire,
}

impl DeploymentWire {
    fn into_summary(self) -> DeploymentSummary {
        DeploymentSummary {
            name: self.metadata.name,
            namespace: self.metadata.namespace,
            desired_replicas: self.spec.replicas.unwrap_or_default(),
            updated_replicas: self.status.updated_replicas,
            available_replicas: self.status.available_replicas,
            selector: self.spec.selector.match_labels,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DeploymentSpecWire {
    replicas: Option<i32>,
    #[serde(default)]
    selector: LabelSelectorWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelSelectorWire {
    #[serde(default)]
    match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentStatusWire {
    #[serde(default)]
    updated_replicas: i32,
    #[serde(default)]
    available_replicas: i32,
}

#[derive(Debug, Deserialize)]
struct AccessReviewWire {
    status: Option<AccessReviewStatusWire>,
}

#[derive(Debug, Default, Deserialize)]
struct AccessReviewStatusWire {
    #[serde(default)]
    allowed: bool,
    reason: Option<String>,
}
