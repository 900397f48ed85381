//! Stage 2 of the request pipeline: the subscription gate.
//!
//! Free-tier users are locked out of premium routes with a 402 the client
//! can route to an upgrade page. Responses for authenticated users carry
//! an `X-Subscription-Tier` header with the effective tier.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header::HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use finagent_core::subscription::Tier;
use finagent_db::repositories::subscription_of;

use crate::AppState;
use crate::middleware::auth::CurrentUser;

/// Header carrying the effective tier on gated responses.
static TIER_HEADER: HeaderName = HeaderName::from_static("x-subscription-tier");

/// Paths that never hit the gate: authentication, payment callbacks,
/// starting the trial itself, and health probes.
const EXEMPT_PREFIXES: [&str; 3] = ["/api/v1/auth/", "/api/v1/payment/", "/health"];

const START_TRIAL_PATH: &str = "/api/v1/subscription/start-trial";

fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) || path == START_TRIAL_PATH
}

/// Premium routes, matched by path fragment: reports, AI features,
/// document OCR, and forecasting.
fn is_premium_path(path: &str) -> bool {
    path.contains("/reports/")
        || path.starts_with("/api/v1/ai/")
        || path.contains("/ocr")
        || path.contains("/forecast")
}

/// Subscription-gate middleware. Runs after token validation.
pub async fn subscription_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if is_exempt(&path) {
        return next.run(request).await;
    }

    // Anonymous requests pass; protected handlers reject them themselves.
    let Some(current) = request.extensions().get::<CurrentUser>().cloned() else {
        return next.run(request).await;
    };

    let now = state.clock.now();
    let tier = subscription_of(&current.user).effective_tier(&state.policy, now);

    if tier == Tier::Free && is_premium_path(&path) {
        warn!(user_id = current.user.id, path = %path, "premium route locked for free tier");
        let mut response = (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({
                "error": "FEATURE_LOCKED",
                "message": "This feature requires a trial or paid subscription.",
                "tier": tier.as_str(),
                "upgradeUrl": "/subscription",
            })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(TIER_HEADER.clone(), HeaderValue::from_static(tier.as_str()));
        return response;
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(TIER_HEADER.clone(), HeaderValue::from_static(tier.as_str()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exemptions_cover_public_surfaces() {
        assert!(is_exempt("/api/v1/auth/login"));
        assert!(is_exempt("/api/v1/auth/register"));
        assert!(is_exempt("/api/v1/payment/webhook"));
        assert!(is_exempt("/api/v1/subscription/start-trial"));
        assert!(is_exempt("/health"));

        assert!(!is_exempt("/api/v1/subscription/status"));
        assert!(!is_exempt("/api/v1/7/transactions"));
    }

    #[test]
    fn premium_patterns_match_report_and_ai_routes() {
        assert!(is_premium_path("/api/v1/7/reports/pnl"));
        assert!(is_premium_path("/api/v1/7/reports/summary"));
        assert!(is_premium_path("/api/v1/ai/chat"));
        assert!(is_premium_path("/api/v1/documents/ocr"));
        assert!(is_premium_path("/api/v1/7/forecast"));

        assert!(!is_premium_path("/api/v1/7/transactions"));
        assert!(!is_premium_path("/api/v1/7/anomalies"));
        assert!(!is_premium_path("/api/v1/subscription/status"));
    }
}
