//! Application services and ports for the command gateway.

#![forbid(unsafe_code)]

mod cluster_ports;
mod command_gateway_service;
mod execution_dispatcher;
mod health_service;
mod rate_limit_service;
mod translation_service;

pub use cluster_ports::ClusterClient;
pub use command_gateway_service::{
    AccessDecision, AccessRequest, AuditSink, CommandGatewayService, CommandOutcome,
    PermissionAuthority,
};
pub use execution_dispatcher::ExecutionDispatcher;
pub use health_service::HealthService;
pub use rate_limit_service::{RateLimitRepository, RateLimitRule, RateLimitService};
pub use translation_service::{CommandTranslator, TranslationService};
