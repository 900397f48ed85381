//! Authentication claims and wire payloads.

use serde::{Deserialize, Serialize};

/// Claims carried by a signed access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email address.
    pub sub: String,
    /// Tenant bound to this token at issue time.
    #[serde(rename = "companyId")]
    pub company_id: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token type tag; always `"access"`.
    #[serde(rename = "type")]
    pub token_type: String,
}

impl Claims {
    /// Returns the subject email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.sub
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// Display name for the tenant created alongside the account.
    pub company_name: String,
}

/// Response returned after successful registration or login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Signed access token.
    pub token: String,
    /// Tenant bound to the token.
    pub company_id: i64,
    /// Authenticated email.
    pub email: String,
    /// Effective subscription tier (FREE, TRIAL, or ACTIVE).
    pub subscription_status: String,
    /// Days remaining in the trial, zero when not on trial.
    pub trial_days_remaining: i64,
    /// AI chats remaining today under the current tier.
    pub ai_chats_remaining: u32,
}
