//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bearer token configuration.
    pub token: TokenSettings,
    /// Message broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Token revocation store configuration.
    #[serde(default)]
    pub revocation: RevocationConfig,
    /// SMTP mail configuration. Absent means mail is disabled.
    #[serde(default)]
    pub mail: Option<MailConfig>,
    /// Authentication rate limit configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Subscription and quota configuration.
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    /// External AI service configuration.
    #[serde(default)]
    pub ai: AiConfig,
    /// Payment gateway configuration.
    #[serde(default)]
    pub payment: PaymentConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    /// Base64-encoded signing secret; must decode to at least 32 bytes.
    pub secret: String,
    /// Token time-to-live in seconds.
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    86_400 // 24 hours
}

/// Message broker configuration.
///
/// When `url` is absent the application runs with a no-op publisher and
/// no anomaly consumer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerConfig {
    /// AMQP connection URL.
    pub url: Option<String>,
}

/// Token revocation store configuration.
///
/// When `redis_url` is absent, revocation degrades to a no-op store
/// (acceptable for single-replica deployments).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevocationConfig {
    /// Redis connection URL.
    pub redis_url: Option<String>,
}

/// SMTP mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay hostname.
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Send timeout in seconds.
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Finagent".to_string()
}

fn default_mail_timeout() -> u64 {
    10
}

/// Authentication rate limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts allowed per window per IP.
    #[serde(default = "default_login_max")]
    pub login_max_attempts: u32,
    /// Login window length in seconds.
    #[serde(default = "default_login_window")]
    pub login_window_secs: u64,
    /// Registration attempts allowed per window per IP.
    #[serde(default = "default_register_max")]
    pub register_max_attempts: u32,
    /// Registration window length in seconds.
    #[serde(default = "default_register_window")]
    pub register_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max_attempts: default_login_max(),
            login_window_secs: default_login_window(),
            register_max_attempts: default_register_max(),
            register_window_secs: default_register_window(),
        }
    }
}

fn default_login_max() -> u32 {
    5
}

fn default_login_window() -> u64 {
    60
}

fn default_register_max() -> u32 {
    3
}

fn default_register_window() -> u64 {
    600
}

/// Subscription and quota configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Free trial length in days.
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
    /// Paid subscription period in days.
    #[serde(default = "default_period_days")]
    pub period_days: u32,
    /// Daily AI chat allowance on the free tier.
    #[serde(default = "default_free_chats")]
    pub free_daily_ai_chats: u32,
    /// Daily AI chat allowance during the trial.
    #[serde(default = "default_trial_chats")]
    pub trial_daily_ai_chats: u32,
    /// Daily AI chat allowance for paid subscribers.
    #[serde(default = "default_active_chats")]
    pub active_daily_ai_chats: u32,
    /// Default currency for newly registered tenants (ISO 4217).
    #[serde(default = "default_tenant_currency")]
    pub tenant_currency: String,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            period_days: default_period_days(),
            free_daily_ai_chats: default_free_chats(),
            trial_daily_ai_chats: default_trial_chats(),
            active_daily_ai_chats: default_active_chats(),
            tenant_currency: default_tenant_currency(),
        }
    }
}

fn default_trial_days() -> u32 {
    5
}

fn default_period_days() -> u32 {
    30
}

fn default_free_chats() -> u32 {
    3
}

fn default_trial_chats() -> u32 {
    10
}

fn default_active_chats() -> u32 {
    50
}

fn default_tenant_currency() -> String {
    "USD".to_string()
}

/// External AI service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiConfig {
    /// Base URL of the AI service. Absent means the AI proxy is disabled.
    pub url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_ai_timeout() -> u64 {
    5
}

/// Payment gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Shared secret for webhook signature verification.
    pub webhook_secret: Option<String>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any origin.
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
        }
    }
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FINAGENT").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_defaults_match_policy() {
        let cfg = RateLimitConfig::default();
        assert_eq!(cfg.login_max_attempts, 5);
        assert_eq!(cfg.login_window_secs, 60);
        assert_eq!(cfg.register_max_attempts, 3);
        assert_eq!(cfg.register_window_secs, 600);
    }

    #[test]
    fn subscription_defaults_match_tiers() {
        let cfg = SubscriptionConfig::default();
        assert_eq!(cfg.trial_days, 5);
        assert_eq!(cfg.period_days, 30);
        assert_eq!(cfg.free_daily_ai_chats, 3);
        assert_eq!(cfg.trial_daily_ai_chats, 10);
        assert_eq!(cfg.active_daily_ai_chats, 50);
    }
}
