//! AI chat proxy with per-user daily quota enforcement.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::error;

use finagent_db::SubscriptionRepository;
use finagent_db::repositories::{AiChatOutcome, subscription_of};
use finagent_shared::AppError;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Creates the AI routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ai/chat", post(chat))
}

/// POST /ai/chat - Consume one daily chat slot, then proxy to the AI
/// service.
async fn chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let subscriptions = SubscriptionRepository::new((*state.db).clone());
    let now = state.clock.now();

    let outcome = subscriptions
        .consume_ai_chat(auth.user().id, &state.policy, now)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let remaining = match outcome {
        AiChatOutcome::Exceeded { limit } => {
            let tier = subscription_of(auth.user()).effective_tier(&state.policy, now);
            return Ok((
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "DAILY_LIMIT_EXCEEDED",
                    "message": format!(
                        "You've used all {limit} AI chats for today. Resets at midnight."
                    ),
                    "tier": tier.as_str(),
                    "dailyLimit": limit,
                    "upgradeUrl": "/subscription",
                })),
            )
                .into_response());
        }
        AiChatOutcome::Allowed { remaining } => remaining,
    };

    let limit = subscription_of(auth.user()).daily_ai_chat_limit(&state.policy, now);

    match state.ai.chat(payload).await {
        Ok(mut reply) => {
            if let Some(map) = reply.as_object_mut() {
                map.insert("aiChatsRemaining".to_string(), json!(remaining));
                map.insert("aiChatDailyLimit".to_string(), json!(limit));
            }
            Ok(Json(reply).into_response())
        }
        Err(e) => {
            error!(user_id = auth.user().id, error = %e, "AI service request failed");
            Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "AI_SERVICE_UNAVAILABLE",
                    "message": "The AI assistant is temporarily unavailable. Please try again shortly.",
                })),
            )
                .into_response())
        }
    }
}
