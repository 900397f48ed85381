//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Domain services return these; the HTTP adapter is the only place that
/// maps them to status codes and response bodies.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed validation.
    #[error("{0}")]
    Validation(String),

    /// Login failure. Deliberately opaque: the same error is returned for
    /// an unknown email and a wrong password.
    #[error("Invalid email or password")]
    BadCredentials,

    /// Missing or invalid bearer token.
    #[error("Authentication required")]
    AuthRequired,

    /// Subscription gate rejection.
    #[error("{0}")]
    FeatureLocked(String),

    /// Access denied.
    #[error("Access denied")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict (e.g., duplicate email).
    #[error("{0}")]
    Conflict(String),

    /// Upload exceeds the configured size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Daily AI chat quota exhausted.
    #[error("{0}")]
    QuotaExceeded(String),

    /// Rate limiter bucket empty.
    #[error("{0}")]
    RateLimited(String),

    /// Downstream service is unreachable or timed out.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::BadCredentials | Self::AuthRequired => 401,
            Self::FeatureLocked(_) => 402,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::PayloadTooLarge(_) => 413,
            Self::QuotaExceeded(_) | Self::RateLimited(_) => 429,
            Self::ServiceUnavailable(_) => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the stable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadCredentials => "BAD_CREDENTIALS",
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::FeatureLocked(_) => "FEATURE_LOCKED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(AppError::Validation("x".into()).status_code(), 400);
        assert_eq!(AppError::BadCredentials.status_code(), 401);
        assert_eq!(AppError::AuthRequired.status_code(), 401);
        assert_eq!(AppError::FeatureLocked("x".into()).status_code(), 402);
        assert_eq!(AppError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(AppError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AppError::Conflict("x".into()).status_code(), 409);
        assert_eq!(AppError::PayloadTooLarge("x".into()).status_code(), 413);
        assert_eq!(AppError::QuotaExceeded("x".into()).status_code(), 429);
        assert_eq!(AppError::RateLimited("x".into()).status_code(), 429);
        assert_eq!(AppError::ServiceUnavailable("x".into()).status_code(), 503);
        assert_eq!(AppError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn bad_credentials_message_is_opaque() {
        assert_eq!(AppError::BadCredentials.to_string(), "Invalid email or password");
    }

    #[test]
    fn forbidden_message_hides_detail() {
        // The variant carries context for logging, but the client-facing
        // message must not reveal whether the target entity exists.
        let err = AppError::Forbidden("user 1 does not own company 9".into());
        assert_eq!(err.to_string(), "Access denied");
    }

    #[test]
    fn internal_errors_share_a_code() {
        assert_eq!(AppError::Database("boom".into()).error_code(), "INTERNAL_ERROR");
        assert_eq!(AppError::Internal("boom".into()).error_code(), "INTERNAL_ERROR");
    }
}
