use axum::Json;
use axum::extract::{Query, State};
use kubegate_domain::PodSummary;

use crate::dto::{ClusterHealthResponse, ContextResponse, InsightsQuery, InsightsResponse, PodInsight};
use crate::error::ApiResult;
use crate::state::AppState;

/// Serves the cached cluster-health snapshot.
pub async fn cluster_health_handler(
    State(state): State<AppState>,
) -> Json<ClusterHealthResponse> {
    let snapshot = state.health_service.snapshot().await;
    Json(ClusterHealthResponse::from(snapshot))
}

/// Serves cluster context: namespaces, pod count and node readiness.
pub async fn context_handler(State(state): State<AppState>) -> ApiResult<Json<ContextResponse>> {
    let namespaces = state.cluster_client.list_namespaces().await?;
    let pods = state.cluster_client.list_pods(None).await?;
    let nodes = state.cluster_client.list_nodes().await?;
    let nodes_ready = nodes.iter().filter(|node| node.ready).count();

    Ok(Json(ContextResponse {
        cluster: state.cluster_name.clone(),
        namespaces,
        pods_total: pods.len(),
        nodes_total: nodes.len(),
        nodes_ready,
    }))
}

/// Flags pods that are crash-looping or restarting, optionally filtered by
/// severity.
pub async fn insights_handler(
    State(state): State<AppState>,
    Query(query): Query<InsightsQuery>,
) -> ApiResult<Json<InsightsResponse>> {
    let pods = state.cluster_client.list_pods(None).await?;

    let mut insights: Vec<PodInsight> = pods.iter().filter_map(pod_insight).collect();
    if let Some(severity) = query.severity.as_deref() {
        insights.retain(|insight| insight.severity == severity);
    }

    Ok(Json(InsightsResponse {
        cluster: state.cluster_name.clone(),
        insights,
    }))
}

fn pod_insight(pod: &PodSummary) -> Option<PodInsight> {
    let offender = pod
        .containers
        .iter()
        .find(|container| container.waiting_reason.is_some() || container.restart_count > 0)?;

    let reason = offender
        .waiting_reason
        .clone()
        .unwrap_or_else(|| "Restarting".to_owned());

    Some(PodInsight {
        pod: pod.name.clone(),
        namespace: pod.namespace.clone(),
        severity: severity(&reason, offender.restart_count),
        restarts: offender.restart_count,
        suggestion: format!(
            "kubectl logs {} -n {} for container '{}'",
            pod.name, pod.namespace, offender.name
        ),
        reason,
    })
}

fn severity(reason: &str, restarts: u32) -> &'static str {
    if reason == "CrashLoopBackOff" || restarts >= 5 {
        "high"
    } else if restarts >= 2 {
        "medium"
    } else {
        "low"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use kubegate_domain::{ContainerStatus, PodSummary};

    use super::{pod_insight, severity};

    fn pod(restarts: u32, waiting_reason: Option<&str>) -> PodSummary {
        PodSummary {
            name: "api-7d4b".to_owned(),
            namespace: "web".to_owned(),
            phase: "Running".to_owned(),
            containers: vec![ContainerStatus {
                name: "api".to_owned(),
                ready: false,
                restart_count: restarts,
                waiting_reason: waiting_reason.map(str::to_owned),
            }],
            labels: BTreeMap::new(),
            node_name: None,
            started_at: None,
            created_at: None,
        }
    }

    #[test]
    fn crash_loop_is_always_high() {
        assert_eq!(severity("CrashLoopBackOff", 0), "high");
        assert_eq!(severity("CrashLoopBackOff", 1), "high");
    }

    #[test]
    fn restart_counts_grade_the_ladder() {
        assert_eq!(severity("Restarting", 7), "high");
        assert_eq!(severity("Restarting", 3), "medium");
        assert_eq!(severity("Restarting", 1), "low");
    }

    #[test]
    fn healthy_pod_yields_no_insight() {
        assert!(pod_insight(&pod(0, None)).is_none());
    }

    #[test]
    fn waiting_pod_yields_an_insight() {
        let insight = pod_insight(&pod(4, Some("CrashLoopBackOff")));
        let Some(insight) = insight else { unreachable!() };
        assert_eq!(insight.reason, "CrashLoopBackOff");
        assert_eq!(insight.severity, "high");
        assert_eq!(insight.restarts, 4);
        assert!(insight.suggestion.contains("kubectl logs api-7d4b -n web"));
    }
}
