//! Bearer token issuing and validation.
//!
//! Tokens are HMAC-SHA-256 signed JSON claims carrying the user's email
//! and bound tenant. The signing secret is supplied base64-encoded and
//! must decode to at least 32 bytes; anything weaker aborts startup.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::auth::Claims;
use crate::config::TokenSettings;

/// Minimum decoded secret length in bytes.
const MIN_SECRET_BYTES: usize = 32;

/// Token configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Base64-encoded signing secret.
    pub secret: String,
    /// Token time-to-live in seconds.
    pub ttl_secs: u64,
}

impl From<&TokenSettings> for TokenConfig {
    fn from(settings: &TokenSettings) -> Self {
        Self {
            secret: settings.secret.clone(),
            ttl_secs: settings.ttl_secs,
        }
    }
}

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The configured secret is not valid base64 or is too short.
    #[error("token secret must be base64-encoded and at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,

    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Token is not a well-formed signed claims envelope.
    #[error("malformed token")]
    Malformed,

    /// Token signature does not verify.
    #[error("invalid token signature")]
    BadSignature,

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// Service for issuing and validating bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    ttl_secs: u64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl TokenService {
    /// Creates a new token service from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::WeakSecret` if the secret is not base64 or
    /// decodes to fewer than 32 bytes.
    pub fn new(config: &TokenConfig) -> Result<Self, TokenError> {
        let key_bytes = BASE64
            .decode(config.secret.trim())
            .map_err(|_| TokenError::WeakSecret)?;
        if key_bytes.len() < MIN_SECRET_BYTES {
            return Err(TokenError::WeakSecret);
        }

        Ok(Self {
            ttl_secs: config.ttl_secs,
            encoding_key: EncodingKey::from_secret(&key_bytes),
            decoding_key: DecodingKey::from_secret(&key_bytes),
        })
    }

    /// Issues a signed access token bound to an email and tenant.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    #[allow(clippy::cast_possible_wrap)]
    pub fn issue(
        &self,
        email: &str,
        company_id: i64,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: email.to_string(),
            company_id,
            iat: now.timestamp(),
            exp: now.timestamp() + self.ttl_secs as i64,
            token_type: "access".to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Validates the signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns `Expired`, `BadSignature`, or `Malformed` depending on what
    /// failed. The signature is always checked before expiry.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }

    /// Returns true if the token verifies and belongs to `expected_email`.
    #[must_use]
    pub fn is_valid_for(&self, token: &str, expected_email: &str) -> bool {
        self.parse(token)
            .map(|claims| claims.sub == expected_email)
            .unwrap_or(false)
    }

    /// Returns the time remaining before the claims expire, clamped to zero.
    #[must_use]
    pub fn remaining_ttl(claims: &Claims, now: DateTime<Utc>) -> Duration {
        let remaining = claims.exp - now.timestamp();
        Duration::seconds(remaining.max(0))
    }

    /// Returns the configured token time-to-live in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 48 zero bytes, base64-encoded.
    const TEST_SECRET: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn create_test_service() -> TokenService {
        TokenService::new(&TokenConfig {
            secret: TEST_SECRET.to_string(),
            ttl_secs: 86_400,
        })
        .unwrap()
    }

    #[test]
    fn issue_then_parse_round_trips_claims() {
        let service = create_test_service();
        let now = Utc::now();

        let token = service.issue("owner@acme.io", 7, now).unwrap();
        let claims = service.parse(&token).unwrap();

        assert_eq!(claims.sub, "owner@acme.io");
        assert_eq!(claims.company_id, 7);
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn short_secret_is_rejected() {
        let result = TokenService::new(&TokenConfig {
            secret: BASE64.encode(b"too-short"),
            ttl_secs: 60,
        });
        assert!(matches!(result, Err(TokenError::WeakSecret)));
    }

    #[test]
    fn non_base64_secret_is_rejected() {
        let result = TokenService::new(&TokenConfig {
            secret: "!!!not-base64!!!".to_string(),
            ttl_secs: 60,
        });
        assert!(matches!(result, Err(TokenError::WeakSecret)));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let service = create_test_service();
        assert!(matches!(
            service.parse("not.a.token"),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn tampered_token_fails_signature_check() {
        let service = create_test_service();
        let other = TokenService::new(&TokenConfig {
            secret: BASE64.encode([7u8; 32]),
            ttl_secs: 86_400,
        })
        .unwrap();

        let token = other.issue("owner@acme.io", 7, Utc::now()).unwrap();
        assert!(matches!(
            service.parse(&token),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = create_test_service();
        let issued = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let token = service.issue("owner@acme.io", 7, issued).unwrap();
        assert!(matches!(service.parse(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn is_valid_for_checks_subject() {
        let service = create_test_service();
        let token = service.issue("owner@acme.io", 7, Utc::now()).unwrap();

        assert!(service.is_valid_for(&token, "owner@acme.io"));
        assert!(!service.is_valid_for(&token, "other@acme.io"));
        assert!(!service.is_valid_for("garbage", "owner@acme.io"));
    }

    #[test]
    fn remaining_ttl_clamps_to_zero() {
        let service = create_test_service();
        let now = Utc::now();
        let token = service.issue("owner@acme.io", 7, now).unwrap();
        let claims = service.parse(&token).unwrap();

        let remaining = TokenService::remaining_ttl(&claims, now);
        assert_eq!(remaining.num_seconds(), 86_400);

        let after_expiry = now + Duration::seconds(86_500);
        assert_eq!(
            TokenService::remaining_ttl(&claims, after_expiry).num_seconds(),
            0
        );
    }
}
