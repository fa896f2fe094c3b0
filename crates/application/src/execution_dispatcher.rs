//! Dispatch of authorized commands to the cluster client.
//!
//! A fixed table keyed by (verb, resource kind); every combination outside it
//! is an explicit unsupported error, never a silent no-op.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kubegate_core::{AppError, AppResult};
use kubegate_domain::{CommandOutput, ParsedCommand, Table};

use crate::cluster_ports::ClusterClient;

/// Maps an authorized, non-dry-run command to a cluster operation.
#[derive(Clone)]
pub struct ExecutionDispatcher {
    cluster: Arc<dyn ClusterClient>,
}

impl ExecutionDispatcher {
    /// Creates a dispatcher over a cluster client.
    #[must_use]
    pub fn new(cluster: Arc<dyn ClusterClient>) -> Self {
        Self { cluster }
    }

    /// Executes a command against the dispatch table.
    pub async fn execute(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        match (command.verb.as_str(), command.resource.as_str()) {
            ("get", "pods" | "pod" | "po") => self.get_pods(command).await,
            ("get", "configmaps" | "configmap" | "cm") => self.get_config_maps(command).await,
            ("logs", _) => self.pod_logs(command).await,
            ("describe", "pod" | "pods") => self.describe_pod(command).await,
            ("describe", "deployment" | "deployments" | "deploy") => {
                self.describe_deployment(command).await
            }
            ("scale", "deployment" | "deployments" | "deploy") => {
                self.scale_deployment(command).await
            }
            (verb, resource) => Err(AppError::Execution(format!(
                "unsupported operation: {verb} {resource}"
            ))),
        }
    }

    async fn get_pods(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        let pods = self.cluster.list_pods(namespace_scope(command)).await?;
        let now = Utc::now();

        let mut table = if command.all_namespaces() {
            Table::new(&["NAMESPACE", "NAME", "READY", "STATUS", "RESTARTS", "AGE"])
        } else {
            Table::new(&["NAME", "READY", "STATUS", "RESTARTS", "AGE"])
        };

        for pod in pods {
            let mut row = Vec::new();
            if command.all_namespaces() {
                row.push(pod.namespace.clone());
            }
            row.push(pod.name.clone());
            row.push(format!("{}/{}", pod.ready_containers(), pod.containers.len()));
            row.push(pod.phase.clone());
            row.push(pod.first_container_restarts().to_string());
            row.push(age_cell(pod.created_at, now));
            table.push_row(row);
        }

        Ok(CommandOutput::Table(table))
    }

    async fn get_config_maps(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        let config_maps = self
            .cluster
            .list_config_maps(namespace_scope(command))
            .await?;
        let now = Utc::now();

        let mut table = if command.all_namespaces() {
            Table::new(&["NAMESPACE", "NAME", "AGE"])
        } else {
            Table::new(&["NAME", "AGE"])
        };

        for config_map in config_maps {
            let mut row = Vec::new();
            if command.all_namespaces() {
                row.push(config_map.namespace.clone());
            }
            row.push(config_map.name.clone());
            row.push(age_cell(config_map.created_at, now));
            table.push_row(row);
        }

        Ok(CommandOutput::Table(table))
    }

    async fn pod_logs(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        // For logs the pod name occupies the resource token.
        let pod_name = command.resource.as_str();
        if pod_name.starts_with('-') {
            return Err(AppError::Execution(
                "pod name not specified for logs command".to_owned(),
            ));
        }

        let namespace = single_namespace(command)?;
        let logs = self.cluster.pod_logs(namespace, pod_name).await?;
        Ok(CommandOutput::Text(logs))
    }

    async fn describe_pod(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        let name = required_name(command)?;
        let namespace = single_namespace(command)?;
        let pod = self.cluster.get_pod(namespace, name).await?;

        let text = format!(
            "Name:         {}\n\
             Namespace:    {}\n\
             Node:         {}\n\
             Start Time:   {}\n\
             Status:       {}\n\
             Ready:        {}/{}\n\
             Restarts:     {}\n",
            pod.name,
            pod.namespace,
            pod.node_name.as_deref().unwrap_or("<none>"),
            pod.started_at
                .map(|time| time.to_rfc3339())
                .unwrap_or_else(|| "<unknown>".to_owned()),
            pod.phase,
            pod.ready_containers(),
            pod.containers.len(),
            pod.first_container_restarts(),
        );
        Ok(CommandOutput::Text(text))
    }

    async fn describe_deployment(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        let name = required_name(command)?;
        let namespace = single_namespace(command)?;
        let deployment = self.cluster.get_deployment(namespace, name).await?;

        let text = format!(
            "Name:       {}\n\
             Namespace:  {}\n\
             Replicas:   {} desired | {} updated | {} available\n\
             Selector:   {}\n",
            deployment.name,
            deployment.namespace,
            deployment.desired_replicas,
            deployment.updated_replicas,
            deployment.available_replicas,
            deployment.selector_string(),
        );
        Ok(CommandOutput::Text(text))
    }

    async fn scale_deployment(&self, command: &ParsedCommand) -> AppResult<CommandOutput> {
        let name = command.resource_name.as_deref().ok_or_else(|| {
            AppError::Execution("could not parse deployment name".to_owned())
        })?;
        let namespace = single_namespace(command)?;
        let replicas = parse_replicas(command)?;

        self.cluster
            .scale_deployment(namespace, name, replicas)
            .await?;
        Ok(CommandOutput::Text(format!(
            "deployment/{name} scaled to {replicas} replicas"
        )))
    }
}

fn namespace_scope(command: &ParsedCommand) -> Option<&str> {
    if command.all_namespaces() {
        None
    } else {
        Some(command.namespace.as_str())
    }
}

fn single_namespace(command: &ParsedCommand) -> AppResult<&str> {
    if command.all_namespaces() {
        return Err(AppError::Execution(
            "command requires a single namespace".to_owned(),
        ));
    }
    Ok(command.namespace.as_str())
}

fn required_name(command: &ParsedCommand) -> AppResult<&str> {
    command
        .resource_name
        .as_deref()
        .ok_or_else(|| AppError::Execution("resource name not specified".to_owned()))
}

fn parse_replicas(command: &ParsedCommand) -> AppResult<u32> {
    let flag = command
        .flags
        .iter()
        .find_map(|flag| flag.strip_prefix("--replicas="))
        .ok_or_else(|| AppError::Execution("missing --replicas=<count> argument".to_owned()))?;

    let replicas = flag.parse::<u32>().map_err(|_| {
        AppError::Execution(format!("invalid replicas argument: {flag}"))
    })?;
    // Only positive counts are dispatched; zero never reaches the cluster.
    if replicas == 0 {
        return Err(AppError::Execution(
            "replicas must be a positive integer".to_owned(),
        ));
    }
    Ok(replicas)
}

fn age_cell(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    created_at
        .map(|created| format_age(created, now))
        .unwrap_or_else(|| "<unknown>".to_owned())
}

/// Humanizes an age the way kubectl does: `42s`, `5m`, `3h`, `2d`.
fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created).num_seconds().max(0);
    if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{}d", seconds / 86_400)
    }
}
