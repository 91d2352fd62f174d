// Broker boundary.
//
// The relay only needs publish and consume over a durable queue with
// at-least-once delivery; queue provisioning, redelivery and
// dead-lettering belong to the broker. Kafka is the production
// implementation, the in-memory channel serves tests and local runs.

pub mod kafka;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::relay::types::WireEnvelope;

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, envelope: &WireEnvelope) -> Result<()>;
}

#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Next delivered envelope; `None` once the source is closed.
    async fn next(&self) -> Result<Option<WireEnvelope>>;

    /// Acknowledge everything delivered so far. Called after a terminal
    /// pipeline outcome; at-least-once semantics.
    async fn commit(&self) -> Result<()>;
}

pub use kafka::{RelayConsumer, RelayProducer};
pub use memory::InMemoryBroker;
