// ============================================================================
// Secure Inbound Pipeline
// ============================================================================
//
// Per-message state machine:
//
//   Received -> Authenticating -> Authenticated | Rejected
//            -> Authorizing    -> Authorized    | Denied
//            -> Dispatched
//
// Stage order is total per message because the stages compose sequentially
// on that message's envelope. There is no shared per-message state, so
// concurrent deliveries cannot interfere; the only shared resource is the
// issuer key material behind the validator.
//
// Fail-closed: a message whose credential is absent, invalid or denied
// terminates here. It is never forwarded downstream carrying a stale or
// null identity header.
//
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::auth::gate::{AuthorizationGate, Decision, DenyReason};
use crate::auth::identity::{AuthenticationResult, IdentityTranslator, Principal};
use crate::auth::validator::{TokenValidator, ValidationError};
use crate::relay::dispatch::MessageDispatcher;
use crate::relay::types::{HeaderValue, MessageEnvelope};

/// Why the authentication stage terminated a message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("missing or blank credential header")]
    MissingCredential,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Terminal outcome of one message's traversal.
///
/// Returned to the consumer loop; drives audit records and offset
/// accounting. Rejected and Denied drop the message from further
/// processing - redelivery, if any, is the broker's concern.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Dispatched(Principal),
    Rejected(RejectReason),
    Denied(DenyReason),
    /// Business-logic failure after authorization; not an auth failure
    DispatchFailed(String),
}

/// Ordered interceptor chain over an inbound message channel:
/// authenticate, establish identity, authorize, dispatch.
pub struct SecureInboundPipeline {
    validator: TokenValidator,
    translator: Arc<dyn IdentityTranslator>,
    gate: AuthorizationGate,
    dispatcher: Arc<dyn MessageDispatcher>,
    credential_header: String,
}

impl SecureInboundPipeline {
    pub fn new(
        validator: TokenValidator,
        translator: Arc<dyn IdentityTranslator>,
        gate: AuthorizationGate,
        dispatcher: Arc<dyn MessageDispatcher>,
        credential_header: &str,
    ) -> Self {
        Self {
            validator,
            translator,
            gate,
            dispatcher,
            credential_header: credential_header.to_string(),
        }
    }

    /// Run one message through the full chain.
    ///
    /// Terminal failures are returned, not raised: one bad message must not
    /// halt processing of subsequent messages.
    pub async fn deliver(&self, envelope: MessageEnvelope) -> PipelineOutcome {
        let envelope = match self.authenticate(envelope).await {
            Ok(envelope) => envelope,
            Err(reason) => {
                tracing::warn!(reason = %reason, "message rejected");
                return PipelineOutcome::Rejected(reason);
            }
        };

        let result = self.attached_result(&envelope);
        if let Decision::Deny(reason) = self.gate.authorize(&result) {
            tracing::warn!(reason = %reason, "message denied");
            return PipelineOutcome::Denied(reason);
        }

        let principal = result
            .principal()
            .cloned()
            .unwrap_or_else(|| Principal {
                username: String::new(),
                authorities: Vec::new(),
            });

        match self.dispatcher.handle(&envelope).await {
            Ok(()) => PipelineOutcome::Dispatched(principal),
            Err(e) => {
                tracing::error!(error = %e, "dispatcher failed after authorization");
                PipelineOutcome::DispatchFailed(e.to_string())
            }
        }
    }

    /// Authenticating stage: extract the credential, validate it, translate
    /// the identity, and attach the result in place of the raw token.
    ///
    /// An absent or blank credential fails fast without invoking the
    /// validator. On success the outgoing envelope carries the
    /// AuthenticationResult in the credential slot - the raw token does not
    /// survive this stage in any forwarded envelope.
    async fn authenticate(&self, envelope: MessageEnvelope) -> Result<MessageEnvelope, RejectReason> {
        let token = match envelope.header(&self.credential_header) {
            Some(HeaderValue::Text(token)) if !token.trim().is_empty() => token.clone(),
            _ => return Err(RejectReason::MissingCredential),
        };

        let claims = self.validator.validate(&token).await?;
        let principal = self.translator.translate(&claims);

        Ok(envelope.with_header(
            &self.credential_header,
            HeaderValue::Authentication(AuthenticationResult::Authenticated(principal)),
        ))
    }

    fn attached_result(&self, envelope: &MessageEnvelope) -> AuthenticationResult {
        envelope
            .header(&self.credential_header)
            .and_then(HeaderValue::as_authentication)
            .cloned()
            // Authenticate always attaches a result; absent means unauthenticated
            .unwrap_or(AuthenticationResult::Unauthenticated)
    }
}
