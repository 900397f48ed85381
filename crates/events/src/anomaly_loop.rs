//! Long-lived consumer of the anomaly results queue.
//!
//! The external worker analyzes published transactions and sends its
//! findings back on `ai.anomaly.results`. This loop persists each finding
//! and fans out one owner notification per message.
//!
//! Drop policy: a message that fails to process is logged and acked
//! anyway. The pipeline is advisory, so availability wins over redelivery;
//! duplicate deliveries are likewise tolerated (they produce duplicate
//! advisory rows, never financial state).

use std::sync::Arc;

use futures_util::StreamExt;
use lapin::options::BasicAckOptions;
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use finagent_db::AnomalyRepository;
use finagent_db::entities::anomalies;
use finagent_shared::Clock;

use crate::messages::AnomalyResultsMessage;
use crate::notifier::AnomalyNotifier;
use crate::rabbitmq::{EventBusError, RabbitMqBus};

/// Consumer tag for the anomaly loop.
const CONSUMER_TAG: &str = "finagent-anomaly-loop";

/// Runs the anomaly results consumer until the broker stream ends.
///
/// The notifier runs on its own task per message so mail I/O never delays
/// the ack.
///
/// # Errors
///
/// Returns an error if the consumer cannot be registered.
pub async fn run_anomaly_loop(
    bus: RabbitMqBus,
    db: DatabaseConnection,
    notifier: Option<Arc<AnomalyNotifier>>,
    clock: Arc<dyn Clock>,
) -> Result<(), EventBusError> {
    let (_channel, mut consumer) = bus.consume_anomaly_results(CONSUMER_TAG).await?;
    info!("anomaly results consumer started");

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "anomaly consumer stream error");
                continue;
            }
        };

        if let Err(e) = process_message(&db, notifier.as_ref(), clock.as_ref(), &delivery.data).await
        {
            // Ack-and-drop: see module docs.
            error!(error = %e, "failed to process anomaly result, dropping message");
        }

        if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
            warn!(error = %e, "failed to ack anomaly result");
        }
    }

    info!("anomaly results consumer stopped");
    Ok(())
}

/// Parses one results message, persists its anomalies, and triggers the
/// notifier once for the whole batch.
async fn process_message(
    db: &DatabaseConnection,
    notifier: Option<&Arc<AnomalyNotifier>>,
    clock: &dyn Clock,
    payload: &[u8],
) -> Result<(), ProcessError> {
    let message: AnomalyResultsMessage =
        serde_json::from_slice(payload).map_err(|e| ProcessError::Parse(e.to_string()))?;

    if message.anomalies.is_empty() {
        info!(company_id = message.company_id, "no anomalies in result");
        return Ok(());
    }

    warn!(
        company_id = message.company_id,
        count = message.anomalies.len(),
        "anomalies detected"
    );

    let repo = AnomalyRepository::new(db.clone());
    let mut saved: Vec<anomalies::Model> = Vec::with_capacity(message.anomalies.len());

    for entry in &message.anomalies {
        let row = repo
            .insert(message.company_id, entry.id, entry.amount, clock.now())
            .await
            .map_err(|e| ProcessError::Store(e.to_string()))?;
        warn!(
            company_id = message.company_id,
            transaction_id = ?entry.id,
            amount = %entry.amount,
            "anomaly persisted"
        );
        saved.push(row);
    }

    // One notification per message, detached from the ack path.
    if let Some(notifier) = notifier {
        let notifier = Arc::clone(notifier);
        let company_id = message.company_id;
        tokio::spawn(async move {
            notifier.notify(company_id, saved).await;
        });
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum ProcessError {
    #[error("unparseable anomaly result: {0}")]
    Parse(String),
    #[error("failed to store anomaly: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_context() {
        let err = ProcessError::Parse("expected value".to_string());
        assert!(err.to_string().contains("unparseable"));
    }

    #[tokio::test]
    async fn empty_batch_is_a_clean_noop() {
        // No database interaction happens for an empty batch, so an
        // unconnected in-memory handle would never be touched; the parse
        // path alone decides the outcome.
        let msg: AnomalyResultsMessage =
            serde_json::from_slice(br#"{"companyId":7,"anomalies":[]}"#).unwrap();
        assert!(msg.anomalies.is_empty());
    }
}
