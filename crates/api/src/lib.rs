//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - The request pipeline: token validation, subscription gate, and
//!   per-handler tenant-ownership checks
//! - Per-IP rate limiting for authentication endpoints
//! - The AI service client port

pub mod ai;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use finagent_core::reports::ReportCache;
use finagent_core::subscription::SubscriptionPolicy;
use finagent_events::EventPublisher;
use finagent_shared::config::{PaymentConfig, SubscriptionConfig};
use finagent_shared::{Clock, RevocationStore, TokenService};

use crate::ai::AiClient;
use crate::rate_limit::AuthRateLimiter;

/// Application state shared across handlers.
///
/// Built once in the composition root and passed by reference; nothing in
/// here is a process-wide singleton.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Token service.
    pub tokens: Arc<TokenService>,
    /// Token revocation store.
    pub revocation: Arc<dyn RevocationStore>,
    /// Per-IP rate limiter for authentication endpoints.
    pub rate_limiter: Arc<AuthRateLimiter>,
    /// P&L report cache.
    pub report_cache: ReportCache,
    /// Event bus publisher.
    pub publisher: Arc<dyn EventPublisher>,
    /// External AI service client.
    pub ai: Arc<dyn AiClient>,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
    /// Subscription policy (trial window, quota limits).
    pub policy: SubscriptionPolicy,
    /// Subscription settings (period length, tenant currency).
    pub subscription: SubscriptionConfig,
    /// Payment webhook settings.
    pub payment: PaymentConfig,
}

/// Creates the main application router.
///
/// The pipeline layers sit on the top-level router, not the nested one,
/// so the path-based exemption checks see the full `/api/v1/...` URI.
/// Layer ordering: the last layer added runs first, so token validation
/// precedes the subscription gate.
#[must_use]
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::api_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::subscription_gate,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
