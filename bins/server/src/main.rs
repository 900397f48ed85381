//! Finagent API server.
//!
//! Composition root: loads configuration, wires every collaborator
//! exactly once, and starts the HTTP server plus the anomaly consumer.
//! External services (broker, revocation store, mail, AI) all degrade to
//! no-op implementations when unconfigured, so the process always starts.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finagent_api::ai::{AiClient, DisabledAiClient, HttpAiClient};
use finagent_api::rate_limit::AuthRateLimiter;
use finagent_api::{AppState, create_router};
use finagent_core::reports::ReportCache;
use finagent_core::subscription::{AiChatLimits, SubscriptionPolicy};
use finagent_events::notifier::AnomalyNotifier;
use finagent_events::{EventPublisher, NoopEventPublisher, RabbitMqBus, run_anomaly_loop};
use finagent_shared::token::TokenConfig;
use finagent_shared::{
    AppConfig, Clock, MailService, NoopRevocationStore, RedisRevocationStore, RevocationStore,
    SystemClock, TokenService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finagent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().expect("Failed to load configuration");

    // A weak signing secret is a fatal misconfiguration.
    let tokens = TokenService::new(&TokenConfig::from(&config.token))?;

    let db = finagent_db::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let revocation: Arc<dyn RevocationStore> = match &config.revocation.redis_url {
        Some(url) => match RedisRevocationStore::connect(url).await {
            Ok(store) => {
                info!("Token revocation store connected");
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "revocation store unavailable, using no-op store");
                Arc::new(NoopRevocationStore)
            }
        },
        None => {
            info!("No revocation store configured, using no-op store");
            Arc::new(NoopRevocationStore)
        }
    };

    let mail = config.mail.clone().map(MailService::new);
    if mail.is_none() {
        info!("Mail not configured, anomaly alerts disabled");
    }

    // The broker is optional: publishing degrades to a logged no-op and
    // the anomaly loop simply does not run.
    let publisher: Arc<dyn EventPublisher> = match &config.broker.url {
        Some(url) => match RabbitMqBus::connect(url).await {
            Ok(bus) => {
                let notifier = mail
                    .clone()
                    .map(|mail| Arc::new(AnomalyNotifier::new(db.clone(), mail)));
                let loop_bus = bus.clone();
                let loop_db = db.clone();
                let loop_clock = Arc::clone(&clock);
                tokio::spawn(async move {
                    if let Err(e) = run_anomaly_loop(loop_bus, loop_db, notifier, loop_clock).await
                    {
                        warn!(error = %e, "anomaly loop terminated");
                    }
                });
                Arc::new(bus)
            }
            Err(e) => {
                warn!(error = %e, "broker unavailable, events will be dropped");
                Arc::new(NoopEventPublisher)
            }
        },
        None => {
            info!("No broker configured, events will be dropped");
            Arc::new(NoopEventPublisher)
        }
    };

    let ai: Arc<dyn AiClient> = match &config.ai.url {
        Some(url) => {
            let timeout = Duration::from_secs(config.ai.timeout_secs);
            match HttpAiClient::new(url, timeout) {
                Ok(client) => {
                    info!(url = %url, "AI service configured");
                    Arc::new(client)
                }
                Err(e) => {
                    warn!(error = %e, "failed to build AI client, AI routes disabled");
                    Arc::new(DisabledAiClient)
                }
            }
        }
        None => {
            info!("No AI service configured");
            Arc::new(DisabledAiClient)
        }
    };

    let policy = SubscriptionPolicy {
        trial_days: config.subscription.trial_days,
        ai_chat_limits: AiChatLimits {
            free: config.subscription.free_daily_ai_chats,
            trial: config.subscription.trial_daily_ai_chats,
            active: config.subscription.active_daily_ai_chats,
        },
    };

    let state = AppState {
        db: Arc::new(db),
        tokens: Arc::new(tokens),
        revocation,
        rate_limiter: Arc::new(AuthRateLimiter::new(&config.rate_limit)),
        report_cache: ReportCache::new(),
        publisher,
        ai,
        clock,
        policy,
        subscription: config.subscription.clone(),
        payment: config.payment.clone(),
    };

    let app = create_router(state, &config.cors.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown handler");
    }
    info!("Shutdown signal received");
}
