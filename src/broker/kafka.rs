// ============================================================================
// Kafka Broker Implementation
// ============================================================================
//
// Producer: at-least-once, idempotent writes, message id as partition key.
// Consumer: manual offset commits - the gateway commits only after the
// pipeline reached a terminal outcome for the message.
//
// ============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::Message;
use tracing::{error, info};

use crate::broker::{MessagePublisher, MessageSource};
use crate::config::BrokerConfig;
use crate::relay::types::WireEnvelope;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RelayProducer {
    producer: FutureProducer,
    destination: String,
}

impl RelayProducer {
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        info!(brokers = %config.brokers, destination = %config.destination, "initializing producer");

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            // Reliability
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "5")
            // Timeouts
            .set("request.timeout.ms", "30000")
            .set("delivery.timeout.ms", "120000")
            .create()
            .context("Failed to create Kafka producer")?;

        Ok(Self {
            producer,
            destination: config.destination.clone(),
        })
    }
}

#[async_trait]
impl MessagePublisher for RelayProducer {
    async fn publish(&self, envelope: &WireEnvelope) -> Result<()> {
        let payload =
            serde_json::to_vec(envelope).context("Failed to serialize wire envelope")?;

        let record = FutureRecord::to(&self.destination)
            .key(envelope.message_id.as_bytes())
            .payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
        {
            Ok((partition, offset)) => {
                tracing::debug!(
                    message_id = %envelope.message_id,
                    partition,
                    offset,
                    "envelope written to broker"
                );
                Ok(())
            }
            Err((e, _)) => {
                error!(error = %e, "failed to publish envelope");
                Err(anyhow::anyhow!("Kafka send failed: {}", e))
            }
        }
    }
}

pub struct RelayConsumer {
    consumer: StreamConsumer,
}

impl RelayConsumer {
    /// Create a consumer subscribed to the relay destination.
    ///
    /// `enable.auto.commit=false`: the gateway commits manually after each
    /// terminal pipeline outcome, so a crash mid-message redelivers.
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        info!(
            brokers = %config.brokers,
            destination = %config.destination,
            group_id = %config.group_id,
            "initializing consumer"
        );

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "30000")
            .set("heartbeat.interval.ms", "3000")
            .create()
            .context("Failed to create Kafka consumer")?;

        consumer
            .subscribe(&[&config.destination])
            .context("Failed to subscribe to relay destination")?;

        Ok(Self { consumer })
    }
}

#[async_trait]
impl MessageSource for RelayConsumer {
    async fn next(&self) -> Result<Option<WireEnvelope>> {
        let message = self.consumer.recv().await.context("Consumer error")?;

        let payload = message
            .payload()
            .context("Delivered message has no payload")?;

        let envelope: WireEnvelope =
            serde_json::from_slice(payload).context("Failed to deserialize wire envelope")?;

        Ok(Some(envelope))
    }

    async fn commit(&self) -> Result<()> {
        self.consumer
            .commit_consumer_state(CommitMode::Sync)
            .context("Failed to commit offset")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires a running Kafka broker"]
    fn consumer_creation_against_local_broker() {
        let config = BrokerConfig {
            brokers: "localhost:9092".to_string(),
            destination: "requests".to_string(),
            group_id: "relay-gateway-test".to_string(),
        };
        let _ = RelayConsumer::new(&config);
    }
}
