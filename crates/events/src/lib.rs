//! Event bus adapter and the asynchronous anomaly pipeline.
//!
//! This crate provides:
//! - The broker topology shared with the out-of-process anomaly worker
//! - An `EventPublisher` port with RabbitMQ and no-op implementations
//! - The anomaly results consumer loop
//! - The best-effort owner notifier

pub mod anomaly_loop;
pub mod messages;
pub mod notifier;
pub mod publisher;
pub mod rabbitmq;

pub use anomaly_loop::run_anomaly_loop;
pub use messages::{AnomalyEntry, AnomalyResultsMessage, TransactionsNewEvent};
pub use notifier::AnomalyNotifier;
pub use publisher::{EventPublisher, NoopEventPublisher, publish_transactions_new};
pub use rabbitmq::{EventBusError, RabbitMqBus};

/// Topic exchange shared by the server and the anomaly worker.
pub const FINANCE_EXCHANGE: &str = "finance.exchange";

/// Queue consumed by the anomaly worker (outbound from this service).
pub const ANOMALY_QUEUE: &str = "ai.anomaly.queue";

/// Queue consumed by this service (inbound results from the worker).
pub const ANOMALY_RESULTS_QUEUE: &str = "ai.anomaly.results";

/// Routing key for freshly persisted transactions.
pub const TRANSACTIONS_NEW_KEY: &str = "transactions.new";

/// Routing key for detected anomalies.
pub const ANOMALIES_DETECTED_KEY: &str = "anomalies.detected";
