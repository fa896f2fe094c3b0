use std::net::SocketAddr;

use axum::Extension;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use kubegate_core::CallerIdentity;

use crate::error::ApiResult;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";
const USER_ID_HEADER: &str = "x-user-id";

/// Tags every response with a generated request id.
pub async fn attach_request_id(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Establishes the caller identity before any limiting or auditing runs.
///
/// A non-empty `x-user-id` header wins; otherwise the peer address stands in.
/// The identity is never derived from the command text.
pub async fn resolve_caller_identity(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(
            || CallerIdentity::new(peer.ip().to_string()),
            CallerIdentity::new,
        );

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Admits or rejects the request against the caller's sliding window.
pub async fn rate_limit(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    state.rate_limit_service.admit(&identity).await?;
    Ok(next.run(request).await)
}
