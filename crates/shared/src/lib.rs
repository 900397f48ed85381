//! Shared types, errors, and configuration for Finagent.
//!
//! This crate provides common building blocks used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - Bearer token issuing and validation
//! - Token revocation store (Redis-backed or no-op)
//! - Injectable clock for deterministic time handling
//! - SMTP mail service

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod mail;
pub mod revocation;
pub mod token;

pub use auth::{AuthResponse, Claims, LoginRequest, RegisterRequest};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use mail::{MailError, MailService};
pub use revocation::{NoopRevocationStore, RedisRevocationStore, RevocationStore};
pub use token::{TokenConfig, TokenError, TokenService};
