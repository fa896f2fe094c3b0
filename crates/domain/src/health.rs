use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse cluster-health summary.
///
/// Exactly one live snapshot is retained by the cache; superseded snapshots
/// are discarded, not versioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Cluster name the snapshot describes.
    pub cluster: String,
    /// False when the reachability probe failed or nodes are not all ready.
    pub healthy: bool,
    /// Total node count.
    pub nodes_total: u32,
    /// Nodes reporting the `Ready` condition.
    pub nodes_ready: u32,
    /// Named system components and their status strings.
    pub components: BTreeMap<String, String>,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
}
