//! Mapping from domain failures to HTTP responses.
//!
//! This is the only place where `AppError` becomes a status code and a
//! wire body. Bodies are `{error, message, timestamp}`; 500-class errors
//! get a generic message so internals never leak.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use finagent_shared::AppError;

/// Wrapper making `AppError` renderable as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            error!(error = %self.0, "request failed");
            "An error occurred. Please try again.".to_string()
        } else {
            self.0.to_string()
        };

        let body = json!({
            "error": self.0.error_code(),
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_map_to_500() {
        let err: ApiError = AppError::Database("secret table is gone".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn quota_errors_map_to_429() {
        let err: ApiError = AppError::QuotaExceeded("cap".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn feature_locked_maps_to_402() {
        let err: ApiError = AppError::FeatureLocked("locked".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::PAYMENT_REQUIRED);
    }
}
