use axum::Json;
use axum::extract::{Extension, State};
use kubegate_core::CallerIdentity;
use kubegate_domain::CommandRequest;

use crate::dto::{CommandResponse, ExecuteCommandRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// Submits a command through the full pipeline.
pub async fn execute_command_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<ExecuteCommandRequest>,
) -> ApiResult<Json<CommandResponse>> {
    submit(state, identity, payload.command, payload.dry_run).await
}

/// Validates a command without executing it, regardless of the payload flag.
pub async fn dry_run_command_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<ExecuteCommandRequest>,
) -> ApiResult<Json<CommandResponse>> {
    submit(state, identity, payload.command, true).await
}

async fn submit(
    state: AppState,
    identity: CallerIdentity,
    command: String,
    dry_run: bool,
) -> ApiResult<Json<CommandResponse>> {
    let outcome = state
        .gateway_service
        .submit(CommandRequest::new(command, identity, dry_run))
        .await?;

    Ok(Json(CommandResponse {
        output: outcome.output,
        cluster: outcome.cluster,
        executed_at: outcome.executed_at,
        dry_run: outcome.dry_run,
    }))
}
