//! Shared primitives for all kubegate crates.

#![forbid(unsafe_code)]

/// Caller identity primitives shared across services.
pub mod identity;

use thiserror::Error;

pub use identity::CallerIdentity;

/// Result type used across kubegate crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Every ambiguous or erroring condition maps to a denial or error variant,
/// never to an implicit allow.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant, including malformed commands.
    #[error("validation error: {0}")]
    Validation(String),

    /// Caller identity is missing or could not be established.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Command rejected by the security policy before any cluster call.
    #[error("security policy denied: {0}")]
    SecurityDenied(String),

    /// Permission authority said no, or the authority was unreachable.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unsupported operation, bad argument, or underlying cluster-call failure.
    #[error("execution error: {0}")]
    Execution(String),

    /// Caller exceeded the admission budget; safe to retry later.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
