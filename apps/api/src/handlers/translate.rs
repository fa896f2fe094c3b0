use axum::Json;
use axum::extract::State;

use crate::dto::{TranslateRequest, TranslateResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Translates a natural-language query into a command suggestion.
///
/// The suggestion is returned to the caller, never executed here; it goes
/// through the full pipeline like any typed command when submitted.
pub async fn translate_handler(
    State(state): State<AppState>,
    Json(payload): Json<TranslateRequest>,
) -> ApiResult<Json<TranslateResponse>> {
    let command = state.translation_service.translate(&payload.query).await?;
    Ok(Json(TranslateResponse { command }))
}
