//! Request pipeline middleware.
//!
//! Every request traverses, in order:
//! 1. Token validation (`auth`) — resolves the user, or passes anonymous.
//! 2. Subscription gate (`subscription`) — locks premium routes for free
//!    tiers and stamps the effective tier on responses.
//!
//! The third stage, tenant ownership, runs per-handler via
//! [`crate::routes::ensure_owner`] because it needs the `company_id` path
//! parameter.

pub mod auth;
pub mod subscription;

pub use auth::{AuthUser, CurrentUser, authenticate};
pub use subscription::subscription_gate;
