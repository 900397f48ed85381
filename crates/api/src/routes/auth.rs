//! Authentication routes: register, login, logout, and token introspection.
//!
//! Register and login are rate limited per IP. Login is hardened against
//! account enumeration: unknown email and wrong password produce the same
//! error, and the password-hash cost is paid either way.

use std::net::SocketAddr;
use std::sync::LazyLock;

use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use finagent_core::auth::{hash_password, validate_password, verify_password};
use finagent_core::subscription::SubscriptionPolicy;
use finagent_db::entities::users;
use finagent_db::repositories::subscription_of;
use finagent_db::{CompanyRepository, UserRepository};
use finagent_shared::{AppError, AuthResponse, LoginRequest, RegisterRequest, TokenService};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::auth::bearer_token;
use crate::middleware::AuthUser;

/// Hash verified against when the email is unknown, so the response
/// latency matches a real verification.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("finagent-dummy-credential").unwrap_or_default());

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Resolves the client IP, honoring a reverse proxy's `X-Forwarded-For`.
pub(crate) fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

/// Builds the subscription fields of an auth response.
fn auth_response(
    token: String,
    company_id: i64,
    user: &users::Model,
    policy: &SubscriptionPolicy,
    now: DateTime<Utc>,
) -> AuthResponse {
    let subscription = subscription_of(user);
    AuthResponse {
        token,
        company_id,
        email: user.email.clone(),
        subscription_status: subscription.effective_tier(policy, now).as_str().to_string(),
        trial_days_remaining: subscription.trial_days_remaining(policy, now),
        ai_chats_remaining: subscription.ai_chats_remaining_today(policy, now),
    }
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), AppError> {
    let email = payload.email.trim();
    if email.is_empty() || email.len() > 255 || !email.contains('@') {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    validate_password(&payload.password).map_err(|v| AppError::Validation(v.to_string()))?;

    let name_len = payload.company_name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(AppError::Validation(
            "Company name must be 2-100 characters".to_string(),
        ));
    }

    Ok(())
}

/// POST /auth/register - Create an account, its default company, and a
/// token.
async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr);
    if !state.rate_limiter.try_consume_register(&ip) {
        warn!(ip = %ip, "registration rate limit exceeded");
        return Err(AppError::RateLimited(
            "Too many registration attempts. Please wait 10 minutes.".to_string(),
        )
        .into());
    }

    validate_registration(&payload)?;

    let users = UserRepository::new((*state.db).clone());
    if users.email_exists(&payload.email).await? {
        return Err(
            AppError::Conflict("An account with this email already exists.".to_string()).into(),
        );
    }

    // Hashing takes hundreds of milliseconds; keep it off the async
    // workers.
    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let now = state.clock.now();
    let (user, company) = users
        .create_with_company(
            &payload.email,
            &password_hash,
            payload.company_name.trim(),
            &state.subscription.tenant_currency,
            now,
        )
        .await?;

    info!(user_id = user.id, company_id = company.id, ip = %ip, "new account registered");

    let token = state
        .tokens
        .issue(&user.email, company.id, now)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let response = auth_response(token, company.id, &user, &state.policy, now);
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Verify credentials and return a token.
async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers, addr);
    if !state.rate_limiter.try_consume_login(&ip) {
        warn!(ip = %ip, "login rate limit exceeded");
        return Err(AppError::RateLimited(
            "Too many login attempts. Please wait 1 minute.".to_string(),
        )
        .into());
    }

    let users = UserRepository::new((*state.db).clone());
    let user = users.find_by_email(&payload.email).await?;

    let Some(user) = user else {
        // Pay the hashing cost anyway so response timing does not reveal
        // whether the email exists.
        let password = payload.password.clone();
        let _ = tokio::task::spawn_blocking(move || verify_password(&password, &DUMMY_HASH)).await;
        warn!(ip = %ip, "login attempt for unknown email");
        return Err(AppError::BadCredentials.into());
    };

    let password = payload.password.clone();
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !verified {
        warn!(user_id = user.id, ip = %ip, "login attempt with wrong password");
        return Err(AppError::BadCredentials.into());
    }

    let companies = CompanyRepository::new((*state.db).clone());
    let company = companies
        .find_first_by_owner(user.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} has no company", user.id)))?;

    let now = state.clock.now();
    let token = state
        .tokens
        .issue(&user.email, company.id, now)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(user_id = user.id, company_id = company.id, ip = %ip, "login succeeded");

    let response = auth_response(token, company.id, &user, &state.policy, now);
    Ok((StatusCode::OK, Json(response)))
}

/// POST /auth/logout - Revoke the presented token for its remaining
/// lifetime. Malformed or absent tokens silently succeed.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = bearer_token(&headers) {
        if let Ok(claims) = state.tokens.parse(token) {
            let remaining = TokenService::remaining_ttl(&claims, state.clock.now());
            let remaining_secs = u64::try_from(remaining.num_seconds()).unwrap_or(0);
            if remaining_secs > 0 {
                state.revocation.revoke(token, remaining_secs).await;
            }
            info!(subject = %claims.sub, "user logged out");
        }
    }

    (
        StatusCode::OK,
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// GET /auth/me - Identity from the token, no database round trip.
async fn me(auth: AuthUser) -> impl IntoResponse {
    Json(json!({
        "email": auth.claims().sub,
        "companyId": auth.claims().company_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn addr() -> SocketAddr {
        "192.0.2.10:45000".parse().unwrap()
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, addr()), "203.0.113.7");
    }

    #[test]
    fn client_ip_falls_back_to_socket() {
        assert_eq!(client_ip(&HeaderMap::new(), addr()), "192.0.2.10");
    }

    #[test]
    fn registration_validation_rejects_bad_payloads() {
        let valid = RegisterRequest {
            email: "a@x.io".to_string(),
            password: "Passw0rd".to_string(),
            company_name: "Acme".to_string(),
        };
        assert!(validate_registration(&valid).is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid.clone()
        };
        assert!(matches!(
            validate_registration(&bad_email),
            Err(AppError::Validation(_))
        ));

        let weak_password = RegisterRequest {
            password: "short".to_string(),
            ..valid.clone()
        };
        assert!(matches!(
            validate_registration(&weak_password),
            Err(AppError::Validation(_))
        ));

        let bad_name = RegisterRequest {
            company_name: "A".to_string(),
            ..valid
        };
        assert!(matches!(
            validate_registration(&bad_name),
            Err(AppError::Validation(_))
        ));
    }
}
