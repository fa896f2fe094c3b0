use axum::Json;

use crate::dto::HealthResponse;

/// Process liveness. Never touches the cluster.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
