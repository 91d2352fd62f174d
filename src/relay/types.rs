use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::identity::AuthenticationResult;

/// Envelope as serialized onto the broker.
///
/// Only string headers exist on the wire; the producer stamps the raw
/// bearer token into the credential header slot, the inbound pipeline
/// replaces it with an in-process authentication result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Unique message ID (UUID v4), also the partition key
    pub message_id: String,
    pub payload: String,
    pub headers: BTreeMap<String, String>,
    /// Unix timestamp in seconds, set at publish time
    pub timestamp: i64,
}

impl WireEnvelope {
    pub fn new(payload: &str) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            payload: payload.to_string(),
            headers: BTreeMap::new(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Structural checks before publish and after consume.
    pub fn validate(&self) -> Result<(), String> {
        if self.message_id.trim().is_empty() {
            return Err("message_id is empty".into());
        }
        if self.headers.keys().any(|k| k.trim().is_empty()) {
            return Err("header name is empty".into());
        }
        Ok(())
    }
}

/// A header value inside the gateway process.
///
/// On the wire every header is text. After the authentication stage the
/// credential slot carries the resolved AuthenticationResult instead, so no
/// downstream stage ever sees the raw token.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Text(String),
    Authentication(AuthenticationResult),
}

impl HeaderValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Authentication(_) => None,
        }
    }

    pub fn as_authentication(&self) -> Option<&AuthenticationResult> {
        match self {
            Self::Authentication(result) => Some(result),
            Self::Text(_) => None,
        }
    }
}

/// The payload-plus-headers unit traversing the pipeline.
///
/// Immutable once constructed: every stage derives a new envelope from the
/// previous one. That keeps concurrent deliveries free of shared mutable
/// message state.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEnvelope {
    message_id: String,
    payload: String,
    headers: BTreeMap<String, HeaderValue>,
}

impl MessageEnvelope {
    pub fn new(message_id: &str, payload: &str) -> Self {
        Self {
            message_id: message_id.to_string(),
            payload: payload.to_string(),
            headers: BTreeMap::new(),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Derive a new envelope with one header replaced.
    pub fn with_header(&self, name: &str, value: HeaderValue) -> Self {
        let mut headers = self.headers.clone();
        headers.insert(name.to_string(), value);
        Self {
            message_id: self.message_id.clone(),
            payload: self.payload.clone(),
            headers,
        }
    }

    /// Derive a new envelope with one header removed.
    pub fn without_header(&self, name: &str) -> Self {
        let mut headers = self.headers.clone();
        headers.remove(name);
        Self {
            message_id: self.message_id.clone(),
            payload: self.payload.clone(),
            headers,
        }
    }
}

impl From<WireEnvelope> for MessageEnvelope {
    fn from(wire: WireEnvelope) -> Self {
        Self {
            message_id: wire.message_id,
            payload: wire.payload,
            headers: wire
                .headers
                .into_iter()
                .map(|(k, v)| (k, HeaderValue::Text(v)))
                .collect(),
        }
    }
}
