//! Request and response payloads for the HTTP surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kubegate_domain::HealthSnapshot;
use serde::{Deserialize, Serialize};

/// Command submission payload.
#[derive(Debug, Deserialize)]
pub struct ExecuteCommandRequest {
    /// Raw command text.
    pub command: String,
    /// Validate without executing.
    #[serde(default)]
    pub dry_run: bool,
}

/// Successful command response.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub output: String,
    pub cluster: String,
    pub executed_at: DateTime<Utc>,
    pub dry_run: bool,
}

/// Natural-language translation request.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub query: String,
}

/// Translated command suggestion. Not executed until submitted.
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub command: String,
}

/// Process liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Cached cluster-health payload.
#[derive(Debug, Serialize)]
pub struct ClusterHealthResponse {
    pub cluster: String,
    pub healthy: bool,
    pub nodes_total: u32,
    pub nodes_ready: u32,
    pub components: BTreeMap<String, String>,
    pub captured_at: DateTime<Utc>,
}

impl From<HealthSnapshot> for ClusterHealthResponse {
    fn from(snapshot: HealthSnapshot) -> Self {
        Self {
            cluster: snapshot.cluster,
            healthy: snapshot.healthy,
            nodes_total: snapshot.nodes_total,
            nodes_ready: snapshot.nodes_ready,
            components: snapshot.components,
            captured_at: snapshot.captured_at,
        }
    }
}

/// Cluster context payload.
#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub cluster: String,
    pub namespaces: Vec<String>,
    pub pods_total: usize,
    pub nodes_total: usize,
    pub nodes_ready: usize,
}

/// Severity filter for pod insights.
#[derive(Debug, Default, Deserialize)]
pub struct InsightsQuery {
    pub severity: Option<String>,
}

/// One problematic pod.
#[derive(Debug, Serialize)]
pub struct PodInsight {
    pub pod: String,
    pub namespace: String,
    pub reason: String,
    pub restarts: u32,
    pub severity: &'static str,
    pub suggestion: String,
}

/// Pod insight collection.
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub cluster: String,
    pub insights: Vec<PodInsight>,
}

#[cfg(test)]
mod tests {
    use super::ExecuteCommandRequest;

    #[test]
    fn dry_run_defaults_to_false() {
        let request: ExecuteCommandRequest =
            serde_json::from_str(r#"{"command": "kubectl get pods"}"#)
                .unwrap_or_else(|_| unreachable!());
        assert!(!request.dry_run);
        assert_eq!(request.command, "kubectl get pods");
    }
}
