use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kubegate_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
    code: &'static str,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match self.0 {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "ERR_VALIDATION"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "ERR_UNAUTHORIZED"),
            AppError::SecurityDenied(_) => (StatusCode::FORBIDDEN, "ERR_SECURITY_POLICY"),
            AppError::AuthorizationDenied(_) => (StatusCode::FORBIDDEN, "ERR_RBAC_DENIED"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "ERR_NOT_FOUND"),
            AppError::Execution(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ERR_EXECUTION"),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "ERR_RATE_LIMITED"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL"),
        };

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
            code,
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use kubegate_core::AppError;

    use super::ApiError;

    #[test]
    fn denials_map_to_forbidden() {
        let security = ApiError(AppError::SecurityDenied("blocked-verb: delete".to_owned()));
        assert_eq!(security.into_response().status(), StatusCode::FORBIDDEN);

        let rbac = ApiError(AppError::AuthorizationDenied("RBAC".to_owned()));
        assert_eq!(rbac.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn rate_limited_maps_to_too_many_requests() {
        let error = ApiError(AppError::RateLimited("slow down".to_owned()));
        assert_eq!(
            error.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn execution_errors_map_to_unprocessable() {
        let error = ApiError(AppError::Execution("unsupported operation".to_owned()));
        assert_eq!(
            error.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
