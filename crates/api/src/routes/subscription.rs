//! Subscription routes: trial start and status.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use finagent_db::SubscriptionRepository;
use finagent_db::repositories::{TrialStart, subscription_of};
use finagent_shared::AppError;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Creates the subscription router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscription/start-trial", post(start_trial))
        .route("/subscription/status", get(status))
}

/// POST /subscription/start-trial - Start the free trial, once per
/// account.
async fn start_trial(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = SubscriptionRepository::new((*state.db).clone());
    let now = state.clock.now();

    match subscriptions
        .start_trial(auth.user().id, now)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
    {
        TrialStart::AlreadyUsed => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "TRIAL_ALREADY_USED",
                "message": "Your free trial has already been used. Please upgrade to continue.",
            })),
        )),
        TrialStart::Started => Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Your free trial has started!",
                "tier": "TRIAL",
                "trialDaysRemaining": state.policy.trial_days,
                "aiChatsRemaining": state.policy.ai_chat_limits.trial,
            })),
        )),
    }
}

/// GET /subscription/status - Current tier, quota, and trial state.
async fn status(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let now = state.clock.now();
    let subscription = subscription_of(auth.user());

    Json(json!({
        "tier": subscription.effective_tier(&state.policy, now).as_str(),
        "status": subscription.status.as_str(),
        "trialDaysRemaining": subscription.trial_days_remaining(&state.policy, now),
        "aiChatsRemaining": subscription.ai_chats_remaining_today(&state.policy, now),
        "aiChatDailyLimit": subscription.daily_ai_chat_limit(&state.policy, now),
        "hasPremiumAccess": subscription.has_premium_access(&state.policy, now),
        "trialAlreadyUsed": subscription.trial_already_used(),
    }))
}
