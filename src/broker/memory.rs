use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use crate::broker::{MessagePublisher, MessageSource};
use crate::relay::types::WireEnvelope;

/// In-process broker over an unbounded channel.
///
/// Preserves the same publish/consume contract as the Kafka pair; commit
/// is a no-op because nothing redelivers.
pub struct InMemoryBroker;

impl InMemoryBroker {
    pub fn channel() -> (InMemoryPublisher, InMemorySource) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            InMemoryPublisher { tx },
            InMemorySource {
                rx: Mutex::new(rx),
            },
        )
    }
}

#[derive(Clone)]
pub struct InMemoryPublisher {
    tx: UnboundedSender<WireEnvelope>,
}

pub struct InMemorySource {
    rx: Mutex<UnboundedReceiver<WireEnvelope>>,
}

impl InMemorySource {
    /// Non-blocking probe used by tests to assert nothing was published.
    pub fn try_next(&self) -> Option<WireEnvelope> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryPublisher {
    async fn publish(&self, envelope: &WireEnvelope) -> Result<()> {
        self.tx
            .send(envelope.clone())
            .map_err(|_| anyhow::anyhow!("in-memory channel closed"))
    }
}

#[async_trait]
impl MessageSource for InMemorySource {
    async fn next(&self) -> Result<Option<WireEnvelope>> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_consume() {
        let (publisher, source) = InMemoryBroker::channel();
        let envelope = WireEnvelope::new("hello").with_header("Authorization", "tok");

        publisher.publish(&envelope).await.unwrap();
        let delivered = source.next().await.unwrap().unwrap();

        assert_eq!(delivered.message_id, envelope.message_id);
        assert_eq!(delivered.payload, "hello");
    }

    #[tokio::test]
    async fn closed_channel_yields_none() {
        let (publisher, source) = InMemoryBroker::channel();
        drop(publisher);
        assert!(source.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn try_next_on_empty_channel() {
        let (_publisher, source) = InMemoryBroker::channel();
        assert!(source.try_next().is_none());
    }
}
