//! Domain entities and invariants for the command gateway.

#![forbid(unsafe_code)]

mod audit;
mod cluster;
mod command;
mod health;
mod output;
mod policy;

pub use audit::AuditRecord;
pub use cluster::{
    ConfigMapSummary, ContainerStatus, DeploymentSummary, NodeSummary, PodSummary,
};
pub use command::{
    ALL_NAMESPACES, CommandRequest, DEFAULT_NAMESPACE, MAX_COMMAND_LENGTH, PROGRAM_NAME,
    ParsedCommand, parse_command,
};
pub use health::HealthSnapshot;
pub use output::{CommandOutput, Table};
pub use policy::{
    ALLOWED_VERBS, BLOCKED_VERBS, DenialReason, SecurityDenial, SecurityVerdict,
    is_whitelisted_resource_name, validate_command,
};
