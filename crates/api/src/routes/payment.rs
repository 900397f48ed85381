//! Payment webhook.
//!
//! The gateway itself is an external collaborator; this route only
//! verifies the signed callback and applies the resulting subscription
//! transition. The endpoint is public but every request must carry a
//! valid HMAC-SHA-256 signature over the raw body.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};

use finagent_db::SubscriptionRepository;
use finagent_db::repositories::SubscriptionError;
use finagent_shared::AppError;

use crate::AppState;
use crate::error::ApiError;

/// Signature header set by the payment gateway.
const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/payment/webhook", post(webhook))
}

/// Webhook event payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookEvent {
    /// Event kind, e.g. `payment.captured`.
    event: String,
    /// Subscriber email.
    email: String,
    /// Gateway's reference for the payment or subscription.
    #[serde(default)]
    payment_ref: Option<String>,
}

/// Verifies the hex-encoded HMAC-SHA-256 signature over the raw body.
fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// POST /payment/webhook - Apply a gateway event to the subscription.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let Some(secret) = state.payment.webhook_secret.as_deref() else {
        warn!("payment webhook received but no webhook secret is configured");
        return Err(AppError::ServiceUnavailable("Payments are not configured".to_string()).into());
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(secret, &body, signature) {
        warn!("payment webhook signature verification failed");
        return Err(AppError::AuthRequired.into());
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Unparseable webhook payload: {e}")))?;

    let subscriptions = SubscriptionRepository::new((*state.db).clone());
    let now = state.clock.now();
    let external_ref = event.payment_ref.as_deref().unwrap_or_default();
    let period_days = state.subscription.period_days;

    let result = match event.event.as_str() {
        "payment.captured" => {
            subscriptions
                .activate(&event.email, external_ref, now, period_days)
                .await
        }
        "subscription.renewed" => {
            subscriptions
                .renew(&event.email, external_ref, now, period_days)
                .await
        }
        "subscription.cancelled" => subscriptions.cancel(&event.email).await,
        other => {
            info!(event = other, "ignoring unhandled payment event");
            return Ok(Json(json!({ "status": "ignored" })));
        }
    };

    match result {
        Ok(()) => {
            info!(event = %event.event, "payment event applied");
            Ok(Json(json!({ "status": "ok" })))
        }
        Err(SubscriptionError::UserNotFound(_)) => {
            // Acknowledge so the gateway stops retrying an event we can
            // never apply.
            warn!(event = %event.event, "payment event for unknown user");
            Ok(Json(json!({ "status": "ignored" })))
        }
        Err(SubscriptionError::Database(e)) => Err(AppError::Database(e.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"event":"payment.captured","email":"a@x.io"}"#;
        let signature = sign("shh", body);
        assert!(verify_signature("shh", body, &signature));
    }

    #[test]
    fn tampered_body_fails() {
        let body = br#"{"event":"payment.captured","email":"a@x.io"}"#;
        let signature = sign("shh", body);
        assert!(!verify_signature(
            "shh",
            br#"{"event":"payment.captured","email":"b@x.io"}"#,
            &signature
        ));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = br#"{"event":"payment.captured","email":"a@x.io"}"#;
        let signature = sign("shh", body);
        assert!(!verify_signature("other", body, &signature));
    }

    #[test]
    fn garbage_signature_fails() {
        assert!(!verify_signature("shh", b"{}", "not-hex"));
        assert!(!verify_signature("shh", b"{}", ""));
    }

    #[test]
    fn event_payload_parses() {
        let event: WebhookEvent = serde_json::from_slice(
            br#"{"event":"subscription.renewed","email":"a@x.io","paymentRef":"pay_123"}"#,
        )
        .unwrap();
        assert_eq!(event.event, "subscription.renewed");
        assert_eq!(event.payment_ref.as_deref(), Some("pay_123"));
    }
}
