//! Stage 1 of the request pipeline: bearer token validation.
//!
//! Requests without a bearer header pass through anonymous; public
//! handlers serve them and protected extractors reject them. A revoked
//! token is treated as anonymous. A token that fails to parse is rejected
//! outright with 401.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use finagent_db::UserRepository;
use finagent_db::entities::users;
use finagent_shared::{AppError, Claims};

use crate::AppState;
use crate::error::ApiError;

/// Authenticated request context attached by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Resolved user row.
    pub user: users::Model,
    /// Claims from the presented token.
    pub claims: Claims,
}

/// Extracts the bearer token from an Authorization header value.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
}

/// Paths that must stay reachable with a bad or stale token: login and
/// register are public, logout must silently succeed on malformed tokens,
/// and the payment webhook authenticates via its own signature.
fn is_public(path: &str) -> bool {
    matches!(
        path,
        "/api/v1/auth/login"
            | "/api/v1/auth/register"
            | "/api/v1/auth/logout"
            | "/api/v1/payment/webhook"
    )
}

/// Token-validation middleware.
///
/// On success the resolved [`CurrentUser`] is stored in request extensions
/// for handlers and later pipeline stages.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        return next.run(request).await;
    };

    // A revoked token no longer identifies anyone.
    if state.revocation.is_revoked(&token).await {
        warn!("revoked token presented, treating request as anonymous");
        return next.run(request).await;
    }

    let claims = match state.tokens.parse(&token) {
        Ok(claims) => claims,
        Err(e) => {
            // Public paths proceed anonymous so a stale token cannot lock
            // a client out of login or logout.
            if is_public(request.uri().path()) {
                return next.run(request).await;
            }
            warn!(error = %e, "rejected bearer token");
            return ApiError(AppError::AuthRequired).into_response();
        }
    };

    let users = UserRepository::new((*state.db).clone());
    match users.find_by_email(&claims.sub).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(CurrentUser { user, claims });
            next.run(request).await
        }
        Ok(None) => {
            if is_public(request.uri().path()) {
                return next.run(request).await;
            }
            warn!(subject = %claims.sub, "token subject no longer exists");
            ApiError(AppError::AuthRequired).into_response()
        }
        Err(e) => {
            error!(error = %e, "user lookup failed during authentication");
            ApiError(AppError::Database(e.to_string())).into_response()
        }
    }
}

/// Extractor for handlers that require an authenticated user.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user().id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl AuthUser {
    /// Returns the resolved user row.
    #[must_use]
    pub fn user(&self) -> &users::Model {
        &self.0.user
    }

    /// Returns the token claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.0.claims
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "AUTH_REQUIRED",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        let empty = HeaderMap::new();
        assert_eq!(bearer_token(&empty), None);
    }

    #[test]
    fn public_paths_tolerate_bad_tokens() {
        assert!(is_public("/api/v1/auth/login"));
        assert!(is_public("/api/v1/auth/register"));
        assert!(is_public("/api/v1/auth/logout"));
        assert!(is_public("/api/v1/payment/webhook"));

        assert!(!is_public("/api/v1/auth/me"));
        assert!(!is_public("/api/v1/7/transactions"));
    }
}
