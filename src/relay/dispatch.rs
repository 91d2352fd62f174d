use async_trait::async_trait;
use thiserror::Error;

use crate::relay::types::{HeaderValue, MessageEnvelope};

/// The dispatcher's own failure. Reported separately from authentication
/// failures and never propagated as one.
#[derive(Debug, Error)]
#[error("dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Terminal handler for authorized messages.
///
/// Invoked only for envelopes that passed the full pipeline; by the time a
/// dispatcher sees an envelope, the credential header carries the resolved
/// authentication result, never the raw token.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn handle(&self, envelope: &MessageEnvelope) -> Result<(), DispatchError>;
}

/// Reference dispatcher: records the payload and full header mapping to the
/// log sink.
#[derive(Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl MessageDispatcher for LoggingDispatcher {
    async fn handle(&self, envelope: &MessageEnvelope) -> Result<(), DispatchError> {
        tracing::info!(
            message_id = %envelope.message_id(),
            payload = %envelope.payload(),
            "got a new message"
        );
        for (name, value) in envelope.headers() {
            match value {
                HeaderValue::Text(text) => {
                    tracing::info!(header = %name, value = %text, "message header");
                }
                HeaderValue::Authentication(result) => {
                    tracing::info!(header = %name, value = ?result, "message header");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_dispatcher_accepts_any_envelope() {
        let envelope = MessageEnvelope::new("m-1", "hello world");
        assert!(LoggingDispatcher.handle(&envelope).await.is_ok());
    }
}
