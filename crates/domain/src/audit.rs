use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable record per command decision.
///
/// A command request produces exactly one record regardless of which pipeline
/// stage terminated it; `success` is true only when the request reached
/// dispatch (or, for a dry-run, authorization) without a denial or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// Caller the decision is attributed to.
    pub identity: String,
    /// Cluster the command targeted.
    pub cluster: String,
    /// Original command text as submitted.
    pub command: String,
    /// Whether the pipeline completed without a denial or error.
    pub success: bool,
    /// Human-readable outcome detail.
    pub detail: String,
}
