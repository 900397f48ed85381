//! Event publisher port.
//!
//! Publishing is a best-effort side channel: a broker outage must never
//! fail the request that triggered the event, and the application must
//! start without a broker at all.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::messages::TransactionsNewEvent;
use crate::rabbitmq::EventBusError;
use crate::TRANSACTIONS_NEW_KEY;

/// Port for publishing JSON events to the broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a JSON payload under a routing key.
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<(), EventBusError>;
}

/// Publisher used when no broker is configured: every publish is a logged
/// no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, routing_key: &str, _payload: Vec<u8>) -> Result<(), EventBusError> {
        debug!(routing_key, "broker not configured, dropping event");
        Ok(())
    }
}

/// Publishes a `transactions.new` event, swallowing every failure.
///
/// Called after the ledger write has committed; the anomaly pipeline is
/// advisory, so a lost event is logged and forgotten.
pub async fn publish_transactions_new(
    publisher: &dyn EventPublisher,
    company_id: i64,
    txn_ids: &[i64],
) {
    let event = TransactionsNewEvent {
        company_id,
        txn_ids: txn_ids.to_vec(),
    };

    let payload = match serde_json::to_vec(&event) {
        Ok(p) => p,
        Err(e) => {
            warn!(company_id, error = %e, "failed to encode transaction event");
            return;
        }
    };

    match publisher.publish(TRANSACTIONS_NEW_KEY, payload).await {
        Ok(()) => info!(
            company_id,
            count = txn_ids.len(),
            "published new-transaction event"
        ),
        Err(e) => warn!(company_id, error = %e, "event publish failed (non-critical)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<(), EventBusError> {
            self.published
                .lock()
                .unwrap()
                .push((routing_key.to_string(), payload));
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(&self, _: &str, _: Vec<u8>) -> Result<(), EventBusError> {
            Err(EventBusError::Broker("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn publishes_expected_payload() {
        let publisher = RecordingPublisher::default();
        publish_transactions_new(&publisher, 7, &[42]).await;

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, TRANSACTIONS_NEW_KEY);

        let body: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(body["companyId"], 7);
        assert_eq!(body["txnIds"], serde_json::json!([42]));
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        // Must not panic or propagate.
        publish_transactions_new(&FailingPublisher, 7, &[42]).await;
    }

    #[tokio::test]
    async fn noop_publisher_accepts_everything() {
        let publisher = NoopEventPublisher;
        assert!(publisher.publish("any.key", vec![1, 2, 3]).await.is_ok());
    }
}
