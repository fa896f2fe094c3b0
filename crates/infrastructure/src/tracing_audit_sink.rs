//! Audit sink that emits records on a dedicated tracing target.

use async_trait::async_trait;
use kubegate_application::AuditSink;
use kubegate_core::AppResult;
use kubegate_domain::AuditRecord;
use tracing::info;

/// Writes audit records to the `audit` tracing target, one event per record.
///
/// Collection is whatever subscriber the process installs; filtering on the
/// target separates the audit stream from operational logs.
#[derive(Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    /// Creates the sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        info!(
            target: "audit",
            timestamp = %record.timestamp.to_rfc3339(),
            identity = %record.identity,
            cluster = %record.cluster,
            command = %record.command,
            success = record.success,
            detail = %record.detail,
            "command audit"
        );
        Ok(())
    }
}
