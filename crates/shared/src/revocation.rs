//! Token revocation store.
//!
//! Logout revokes a token for the remainder of its natural lifetime. The
//! store is an ephemeral key-value service with per-key TTL; entries vanish
//! when the token would have expired anyway.
//!
//! Availability trade-offs, by contract:
//! - `revoke` is best-effort: a store outage must not block logout.
//! - `is_revoked` fails open: on store failure a token reads as NOT
//!   revoked, keeping the API available at the cost of honoring a logout
//!   during the outage window.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, error};

const REVOKED_KEY_PREFIX: &str = "token:revoked:";

/// Ephemeral store of explicitly invalidated tokens.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Marks a token revoked for `ttl_secs` seconds.
    async fn revoke(&self, token: &str, ttl_secs: u64);

    /// Returns true if the token has been revoked.
    async fn is_revoked(&self, token: &str) -> bool;
}

/// Redis-backed revocation store.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisRevocationStore {
    /// Connects to Redis and returns a store handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let key = format!("{REVOKED_KEY_PREFIX}{token}");
        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(key, "revoked", ttl_secs).await {
            Ok(()) => debug!(ttl_secs, "token revoked"),
            Err(e) => error!(error = %e, "failed to store token revocation"),
        }
    }

    async fn is_revoked(&self, token: &str) -> bool {
        let key = format!("{REVOKED_KEY_PREFIX}{token}");
        let mut conn = self.conn.clone();
        match conn.exists::<_, bool>(key).await {
            Ok(revoked) => revoked,
            Err(e) => {
                error!(error = %e, "revocation check failed, treating token as not revoked");
                false
            }
        }
    }
}

/// No-op revocation store: nothing is ever revoked.
///
/// Selected when no key-value store is configured; valid for
/// single-replica deployments where logout only clears client state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRevocationStore;

#[async_trait]
impl RevocationStore for NoopRevocationStore {
    async fn revoke(&self, _token: &str, _ttl_secs: u64) {}

    async fn is_revoked(&self, _token: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_store_never_revokes() {
        let store = NoopRevocationStore;
        store.revoke("some-token", 60).await;
        assert!(!store.is_revoked("some-token").await);
    }
}
