//! Cached cluster health snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use kubegate_domain::HealthSnapshot;
use tokio::sync::Mutex;
use tracing::warn;

use crate::cluster_ports::ClusterClient;

/// Serves health snapshots, recomputing at most once per TTL.
///
/// The cache lock is held across the freshness check and the recompute, so
/// concurrent callers arriving on an expired cache produce a single probe
/// and all observe the same snapshot.
pub struct HealthService {
    cluster: Arc<dyn ClusterClient>,
    cluster_name: String,
    ttl: TimeDelta,
    snapshot: Mutex<Option<HealthSnapshot>>,
}

impl HealthService {
    /// Creates a health service with a snapshot TTL in seconds.
    #[must_use]
    pub fn new(cluster: Arc<dyn ClusterClient>, cluster_name: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            cluster,
            cluster_name: cluster_name.into(),
            ttl: TimeDelta::seconds(ttl_seconds),
            snapshot: Mutex::new(None),
        }
    }

    /// Returns the cached snapshot, recomputing it if absent or expired.
    ///
    /// Probe failures degrade the snapshot rather than erroring: an
    /// unreachable API server or node list yields `healthy: false`.
    pub async fn snapshot(&self) -> HealthSnapshot {
        let mut cached = self.snapshot.lock().await;

        if let Some(snapshot) = cached.as_ref()
            && Utc::now() - snapshot.captured_at < self.ttl
        {
            return snapshot.clone();
        }

        let fresh = self.capture().await;
        *cached = Some(fresh.clone());
        fresh
    }

    async fn capture(&self) -> HealthSnapshot {
        let mut healthy = true;
        let mut components = BTreeMap::new();

        match self.cluster.ping().await {
            Ok(()) => {
                components.insert("api-server".to_owned(), "ok".to_owned());
            }
            Err(err) => {
                warn!(error = %err, "api server unreachable");
                components.insert("api-server".to_owned(), "unreachable".to_owned());
                healthy = false;
            }
        }

        let (nodes_total, nodes_ready) = match self.cluster.list_nodes().await {
            Ok(nodes) => {
                let total = u32::try_from(nodes.len()).unwrap_or(u32::MAX);
                let ready =
                    u32::try_from(nodes.iter().filter(|node| node.ready).count()).unwrap_or(total);
                (total, ready)
            }
            Err(err) => {
                warn!(error = %err, "node list failed");
                healthy = false;
                (0, 0)
            }
        };
        if nodes_ready < nodes_total {
            healthy = false;
        }

        components.insert("scheduler".to_owned(), self.scheduler_status().await);

        HealthSnapshot {
            cluster: self.cluster_name.clone(),
            healthy,
            nodes_total,
            nodes_ready,
            components,
            captured_at: Utc::now(),
        }
    }

    async fn scheduler_status(&self) -> String {
        let Ok(pods) = self.cluster.list_pods(Some("kube-system")).await else {
            return "unknown".to_owned();
        };

        pods.iter()
            .find(|pod| {
                pod.labels
                    .get("component")
                    .is_some_and(|component| component.as_str() == "kube-scheduler")
            })
            .map_or_else(
                || "unknown".to_owned(),
                |pod| {
                    if pod.phase == "Running" {
                        "ok".to_owned()
                    } else {
                        pod.phase.clone()
                    }
                },
            )
    }
}
