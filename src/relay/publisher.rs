use crate::auth::token_client::TokenClient;
use crate::broker::MessagePublisher;
use crate::error::{AppError, AppResult};
use crate::relay::types::WireEnvelope;

/// Producer side: fetch a token, stamp it on the message, hand the
/// envelope to the outbound channel.
///
/// A token fetch failure aborts the send and surfaces to the caller;
/// nothing reaches the outbound channel in that case.
pub struct OutboundPublisher<P: MessagePublisher> {
    tokens: TokenClient,
    channel: P,
    credential_header: String,
}

impl<P: MessagePublisher> OutboundPublisher<P> {
    pub fn new(tokens: TokenClient, channel: P, credential_header: &str) -> Self {
        Self {
            tokens,
            channel,
            credential_header: credential_header.to_string(),
        }
    }

    /// Send one payload; returns the published message id.
    pub async fn send(&self, payload: &str) -> AppResult<String> {
        let token = self.tokens.fetch_token().await?;

        let envelope = WireEnvelope::new(payload).with_header(&self.credential_header, &token);
        envelope.validate().map_err(AppError::Broker)?;

        self.channel
            .publish(&envelope)
            .await
            .map_err(|e| AppError::Broker(e.to_string()))?;

        tracing::info!(message_id = %envelope.message_id, "message published");
        Ok(envelope.message_id)
    }
}
