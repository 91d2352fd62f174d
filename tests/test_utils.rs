#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use relay_gateway::auth::{
    AuthorizationGate, Policy, StaticKeySource, SubjectTranslator, TokenValidator,
};
use relay_gateway::relay::{
    DispatchError, MessageDispatcher, MessageEnvelope, SecureInboundPipeline,
};

pub const SECRET: &[u8] = b"relay-integration-secret";
pub const ISSUER: &str = "https://issuer.example";
pub const FUTURE_EXP: u64 = 4_102_444_800; // 2100-01-01

/// Mint an HS256 test token against the shared static key.
pub fn mint_token(issuer: &str, subject: &str, exp: u64, scope: &str) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        &serde_json::json!({"iss": issuer, "sub": subject, "exp": exp, "scope": scope}),
        &EncodingKey::from_secret(SECRET),
    )
    .unwrap()
}

pub fn valid_token(subject: &str) -> String {
    mint_token(ISSUER, subject, FUTURE_EXP, "user.read")
}

/// Dispatcher that records every envelope it is handed.
#[derive(Default)]
pub struct RecordingDispatcher {
    seen: Mutex<Vec<MessageEnvelope>>,
}

impl RecordingDispatcher {
    pub fn seen(&self) -> Vec<MessageEnvelope> {
        self.seen.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageDispatcher for RecordingDispatcher {
    async fn handle(&self, envelope: &MessageEnvelope) -> Result<(), DispatchError> {
        self.seen.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

pub fn build_pipeline(dispatcher: Arc<dyn MessageDispatcher>) -> SecureInboundPipeline {
    let validator = TokenValidator::new(
        Arc::new(StaticKeySource::from_secret(SECRET)),
        ISSUER,
        vec![Algorithm::HS256],
        0,
        "test-salt",
    );
    SecureInboundPipeline::new(
        validator,
        Arc::new(SubjectTranslator),
        AuthorizationGate::new(Policy::RequireAuthenticated),
        dispatcher,
        "Authorization",
    )
}
