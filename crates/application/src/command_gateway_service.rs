//! Command authorization and execution pipeline.
//!
//! Parse, apply the security policy, consult the permission authority, then
//! dispatch (unless dry-run) and record exactly one audit record. Every
//! ambiguous or erroring stage denies; nothing defaults to allow.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kubegate_core::{AppError, AppResult};
use kubegate_domain::{AuditRecord, CommandRequest, SecurityVerdict, parse_command, validate_command};
use tracing::{error, info};

use crate::execution_dispatcher::ExecutionDispatcher;

/// The exact tuple evaluated by the security policy, forwarded unmodified to
/// the permission authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Target namespace (empty for all namespaces).
    pub namespace: String,
    /// Command verb.
    pub verb: String,
    /// Resource kind.
    pub resource: String,
    /// Resource name, empty when none was parsed.
    pub name: String,
    /// Acting identity the request is attributed to.
    pub identity: String,
}

/// The authority's verdict together with its raw reason string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the authority permits the operation.
    pub allowed: bool,
    /// Authority-provided reason text; not machine-stable.
    pub reason: String,
}

/// Port for the external permission authority.
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Asks whether the identity may perform the operation.
    async fn check(&self, request: &AccessRequest) -> AppResult<AccessDecision>;
}

/// Port for the audit sink. Best-effort and non-transactional.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one immutable audit record.
    async fn append(&self, record: AuditRecord) -> AppResult<()>;
}

/// Caller-visible outcome of an accepted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Rendered command output, or the validation notice for dry-runs.
    pub output: String,
    /// Cluster the command ran against.
    pub cluster: String,
    /// When the pipeline finished.
    pub executed_at: DateTime<Utc>,
    /// Whether this was a dry-run.
    pub dry_run: bool,
}

/// Application service for the command pipeline.
#[derive(Clone)]
pub struct CommandGatewayService {
    authority: Arc<dyn PermissionAuthority>,
    dispatcher: ExecutionDispatcher,
    audit: Arc<dyn AuditSink>,
    cluster_name: String,
}

impl CommandGatewayService {
    /// Creates a gateway over an authority, a dispatcher and an audit sink.
    #[must_use]
    pub fn new(
        authority: Arc<dyn PermissionAuthority>,
        dispatcher: ExecutionDispatcher,
        audit: Arc<dyn AuditSink>,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            authority,
            dispatcher,
            audit,
            cluster_name: cluster_name.into(),
        }
    }

    /// Runs a command request through the full pipeline.
    ///
    /// Exactly one audit record is emitted per request, at whichever stage
    /// produced the terminal verdict. An audit-sink failure is surfaced on
    /// the operational log and never alters the caller-visible result.
    pub async fn submit(&self, request: CommandRequest) -> AppResult<CommandOutcome> {
        let result = self.process(&request).await;

        let (success, detail) = match &result {
            Ok(output) => (true, output.clone()),
            Err(err) => (false, err.to_string()),
        };
        self.record(&request, success, detail).await;

        result.map(|output| CommandOutcome {
            output,
            cluster: self.cluster_name.clone(),
            executed_at: Utc::now(),
            dry_run: request.dry_run,
        })
    }

    async fn process(&self, request: &CommandRequest) -> AppResult<String> {
        let parsed = parse_command(&request.text)?;

        if let SecurityVerdict::Denied(denial) = validate_command(&parsed, &request.text) {
            return Err(AppError::SecurityDenied(format!(
                "{}: {}",
                denial.reason.as_str(),
                denial.token
            )));
        }

        let access = AccessRequest {
            namespace: parsed.namespace.clone(),
            verb: parsed.verb.clone(),
            resource: parsed.resource.clone(),
            name: parsed.resource_name.clone().unwrap_or_default(),
            identity: request.identity.as_str().to_owned(),
        };

        // Authority unreachable is a deny, not an allow.
        let decision = self
            .authority
            .check(&access)
            .await
            .map_err(|err| AppError::AuthorizationDenied(err.to_string()))?;

        // Allow decisions are as much an audit fact as denials.
        info!(
            namespace = %access.namespace,
            verb = %access.verb,
            resource = %access.resource,
            name = %access.name,
            identity = %access.identity,
            allowed = decision.allowed,
            reason = %decision.reason,
            "authorization decision"
        );

        if !decision.allowed {
            return Err(AppError::AuthorizationDenied(decision.reason));
        }

        if request.dry_run {
            return Ok("command validated successfully".to_owned());
        }

        let output = self.dispatcher.execute(&parsed).await?;
        Ok(output.render())
    }

    async fn record(&self, request: &CommandRequest, success: bool, detail: String) {
        let record = AuditRecord {
            timestamp: Utc::now(),
            identity: request.identity.as_str().to_owned(),
            cluster: self.cluster_name.clone(),
            command: request.text.clone(),
            success,
            detail,
        };

        if let Err(err) = self.audit.append(record).await {
            error!(error = %err, "failed to append audit record");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use kubegate_core::{AppError, AppResult, CallerIdentity};
    use kubegate_domain::{
        AuditRecord, CommandRequest, ConfigMapSummary, ContainerStatus, DeploymentSummary,
        NodeSummary, PodSummary,
    };
    use tokio::sync::Mutex;

    use crate::cluster_ports::ClusterClient;
    use crate::execution_dispatcher::ExecutionDispatcher;

    use super::{
        AccessDecision, AccessRequest, AuditSink, CommandGatewayService, PermissionAuthority,
    };

    struct FakeAuthority {
        allowed: bool,
        reason: String,
        fail: bool,
        requests: Mutex<Vec<AccessRequest>>,
    }

    impl FakeAuthority {
        fn allowing() -> Self {
            Self {
                allowed: true,
                reason: "RBAC: allowed by ClusterRoleBinding".to_owned(),
                fail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn denying(reason: &str) -> Self {
            Self {
                allowed: false,
                reason: reason.to_owned(),
                fail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn unreachable() -> Self {
            Self {
                allowed: false,
                reason: String::new(),
                fail: true,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PermissionAuthority for FakeAuthority {
        async fn check(&self, request: &AccessRequest) -> AppResult<AccessDecision> {
            self.requests.lock().await.push(request.clone());
            if self.fail {
                return Err(AppError::Internal(
                    "connection refused to authority".to_owned(),
                ));
            }
            Ok(AccessDecision {
                allowed: self.allowed,
                reason: self.reason.clone(),
            })
        }
    }

    #[derive(Default)]
    struct FakeAuditSink {
        records: Mutex<Vec<AuditRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl AuditSink for FakeAuditSink {
        async fn append(&self, record: AuditRecord) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Internal("audit backend offline".to_owned()));
            }
            self.records.lock().await.push(record);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeClusterClient {
        scale_calls: AtomicU32,
    }

    #[async_trait]
    impl ClusterClient for FakeClusterClient {
        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }

        async fn list_pods(&self, _namespace: Option<&str>) -> AppResult<Vec<PodSummary>> {
            Ok(vec![PodSummary {
                name: "frontend".to_owned(),
                namespace: "default".to_owned(),
                phase: "Running".to_owned(),
                containers: vec![ContainerStatus {
                    name: "app".to_owned(),
                    ready: true,
                    restart_count: 0,
                    waiting_reason: None,
                }],
                labels: BTreeMap::new(),
                node_name: None,
                started_at: None,
                created_at: Some(Utc::now()),
            }])
        }

        async fn get_pod(&self, _namespace: &str, name: &str) -> AppResult<PodSummary> {
            Err(AppError::NotFound(format!("pod '{name}' not found")))
        }

        async fn list_config_maps(
            &self,
            _namespace: Option<&str>,
        ) -> AppResult<Vec<ConfigMapSummary>> {
            Ok(Vec::new())
        }

        async fn list_nodes(&self) -> AppResult<Vec<NodeSummary>> {
            Ok(Vec::new())
        }

        async fn list_namespaces(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn get_deployment(
            &self,
            _namespace: &str,
            name: &str,
        ) -> AppResult<DeploymentSummary> {
            Err(AppError::NotFound(format!("deployment '{name}' not found")))
        }

        async fn pod_logs(&self, _namespace: &str, _name: &str) -> AppResult<String> {
            Ok(String::new())
        }

        async fn scale_deployment(
            &self,
            _namespace: &str,
            _name: &str,
            _replicas: u32,
        ) -> AppResult<()> {
            self.scale_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        gateway: CommandGatewayService,
        authority: Arc<FakeAuthority>,
        audit: Arc<FakeAuditSink>,
        cluster: Arc<FakeClusterClient>,
    }

    fn harness(authority: FakeAuthority) -> Harness {
        harness_with_audit(authority, FakeAuditSink::default())
    }

    fn harness_with_audit(authority: FakeAuthority, audit: FakeAuditSink) -> Harness {
        let authority = Arc::new(authority);
        let audit = Arc::new(audit);
        let cluster = Arc::new(FakeClusterClient::default());
        let gateway = CommandGatewayService::new(
            authority.clone(),
            ExecutionDispatcher::new(cluster.clone()),
            audit.clone(),
            "dev-cluster",
        );
        Harness {
            gateway,
            authority,
            audit,
            cluster,
        }
    }

    fn request(text: &str, dry_run: bool) -> CommandRequest {
        CommandRequest::new(text, CallerIdentity::new("alice"), dry_run)
    }

    #[tokio::test]
    async fn blocked_verb_is_denied_without_consulting_authority() {
        let harness = harness(FakeAuthority::allowing());

        let result = harness.gateway.submit(request("kubectl delete pod foo", false)).await;

        let Err(AppError::SecurityDenied(message)) = result else {
            unreachable!()
        };
        assert!(message.starts_with("blocked-verb: delete"));
        assert!(harness.authority.requests.lock().await.is_empty());

        let records = harness.audit.records.lock().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].command, "kubectl delete pod foo");
    }

    #[tokio::test]
    async fn blocked_verb_is_denied_even_for_dry_run() {
        let harness = harness(FakeAuthority::allowing());

        let result = harness.gateway.submit(request("kubectl delete pod foo", true)).await;
        assert!(matches!(result, Err(AppError::SecurityDenied(_))));
    }

    #[tokio::test]
    async fn injection_is_denied_before_authorization() {
        let harness = harness(FakeAuthority::allowing());

        let result = harness
            .gateway
            .submit(request("kubectl get pods; rm -rf /", false))
            .await;

        let Err(AppError::SecurityDenied(message)) = result else {
            unreachable!()
        };
        assert!(message.starts_with("injection:"));
        assert!(harness.authority.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn syntax_error_is_audited_as_failure() {
        let harness = harness(FakeAuthority::allowing());

        let result = harness.gateway.submit(request("get pods", false)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let records = harness.audit.records.lock().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
    }

    #[tokio::test]
    async fn allowed_command_executes_and_audits_success() {
        let harness = harness(FakeAuthority::allowing());

        let outcome = harness
            .gateway
            .submit(request("kubectl get pods -n default", false))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(outcome.output.starts_with("NAME\tREADY\tSTATUS\tRESTARTS\tAGE\n"));
        assert!(outcome.output.contains("frontend\t1/1\tRunning"));
        assert_eq!(outcome.cluster, "dev-cluster");
        assert!(!outcome.dry_run);

        let records = harness.audit.records.lock().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert_eq!(records[0].identity, "alice");
    }

    #[tokio::test]
    async fn authority_receives_the_exact_evaluated_tuple() {
        let harness = harness(FakeAuthority::allowing());

        harness
            .gateway
            .submit(request("kubectl scale deployment/frontend --replicas=3 -n web", true))
            .await
            .unwrap_or_else(|_| unreachable!());

        let requests = harness.authority.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].namespace, "web");
        assert_eq!(requests[0].verb, "scale");
        assert_eq!(requests[0].resource, "deployment");
        assert_eq!(requests[0].name, "frontend");
        assert_eq!(requests[0].identity, "alice");
    }

    #[tokio::test]
    async fn authority_denial_carries_the_reason_through() {
        let harness = harness(FakeAuthority::denying("RBAC: access denied"));

        let result = harness
            .gateway
            .submit(request("kubectl get pods -n default", false))
            .await;

        let Err(AppError::AuthorizationDenied(reason)) = result else {
            unreachable!()
        };
        assert_eq!(reason, "RBAC: access denied");

        let records = harness.audit.records.lock().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
    }

    #[tokio::test]
    async fn unreachable_authority_fails_closed() {
        let harness = harness(FakeAuthority::unreachable());

        let result = harness
            .gateway
            .submit(request("kubectl get pods -n default", false))
            .await;

        let Err(AppError::AuthorizationDenied(reason)) = result else {
            unreachable!()
        };
        assert!(reason.contains("connection refused"));
    }

    #[tokio::test]
    async fn dry_run_short_circuits_before_dispatch() {
        let harness = harness(FakeAuthority::allowing());

        for _ in 0..3 {
            let outcome = harness
                .gateway
                .submit(request("kubectl scale deployment/frontend --replicas=3", true))
                .await
                .unwrap_or_else(|_| unreachable!());
            assert_eq!(outcome.output, "command validated successfully");
            assert!(outcome.dry_run);
        }

        // Repeated dry-runs never reach the cluster.
        assert_eq!(harness.cluster.scale_calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.audit.records.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn dispatch_error_is_audited_as_failure() {
        let harness = harness(FakeAuthority::allowing());

        let result = harness
            .gateway
            .submit(request("kubectl describe pod ghost", false))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let records = harness.audit.records.lock().await;
        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert!(records[0].detail.contains("not found"));
    }

    #[tokio::test]
    async fn audit_sink_failure_does_not_change_the_outcome() {
        let harness = harness_with_audit(
            FakeAuthority::allowing(),
            FakeAuditSink {
                records: Mutex::new(Vec::new()),
                fail: true,
            },
        );

        let outcome = harness
            .gateway
            .submit(request("kubectl get pods -n default", false))
            .await;
        assert!(outcome.is_ok());
    }
}
