//! RabbitMQ implementation of the event bus using lapin.

use std::sync::Arc;

use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
    options::{
        BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
};
use thiserror::Error;
use tracing::info;

use crate::publisher::EventPublisher;
use crate::{
    ANOMALIES_DETECTED_KEY, ANOMALY_QUEUE, ANOMALY_RESULTS_QUEUE, FINANCE_EXCHANGE,
    TRANSACTIONS_NEW_KEY,
};

/// Errors from the event bus.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Broker connection or protocol error.
    #[error("broker error: {0}")]
    Broker(String),
}

impl From<lapin::Error> for EventBusError {
    fn from(e: lapin::Error) -> Self {
        Self::Broker(e.to_string())
    }
}

/// RabbitMQ event bus: one connection, a dedicated publish channel.
#[derive(Clone)]
pub struct RabbitMqBus {
    connection: Arc<Connection>,
    publish_channel: Arc<Channel>,
}

impl RabbitMqBus {
    /// Connects to the broker and declares the shared topology.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// topology cannot be declared.
    pub async fn connect(amqp_url: &str) -> Result<Self, EventBusError> {
        let connection =
            Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        info!("broker connected");

        let publish_channel = connection.create_channel().await?;
        declare_topology(&publish_channel).await?;

        Ok(Self {
            connection: Arc::new(connection),
            publish_channel: Arc::new(publish_channel),
        })
    }

    /// Creates a dedicated channel for a consumer.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be created.
    pub async fn create_consumer_channel(&self) -> Result<Channel, EventBusError> {
        Ok(self.connection.create_channel().await?)
    }

    /// Starts consuming the anomaly results queue with manual acks.
    ///
    /// The channel is returned alongside the consumer; dropping it would
    /// close the consumer, so the caller must keep it alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer cannot be registered.
    pub async fn consume_anomaly_results(
        &self,
        consumer_tag: &str,
    ) -> Result<(Channel, lapin::Consumer), EventBusError> {
        let channel = self.create_consumer_channel().await?;
        let consumer = channel
            .basic_consume(
                ANOMALY_RESULTS_QUEUE,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok((channel, consumer))
    }
}

/// Declares the exchange, queues, and bindings. Idempotent: declaration
/// parameters match what the anomaly worker declares on its side.
pub async fn declare_topology(channel: &Channel) -> Result<(), EventBusError> {
    channel
        .exchange_declare(
            FINANCE_EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    for (queue, routing_key) in [
        (ANOMALY_QUEUE, TRANSACTIONS_NEW_KEY),
        (ANOMALY_RESULTS_QUEUE, ANOMALIES_DETECTED_KEY),
    ] {
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                queue,
                FINANCE_EXCHANGE,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
    }

    info!(exchange = FINANCE_EXCHANGE, "broker topology declared");
    Ok(())
}

#[async_trait]
impl EventPublisher for RabbitMqBus {
    async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> Result<(), EventBusError> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2);

        self.publish_channel
            .basic_publish(
                FINANCE_EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &payload,
                properties,
            )
            .await?
            .await?; // wait for broker confirmation

        Ok(())
    }
}
