use std::collections::HashMap;

use serde::Deserialize;

/// The decoded, verified contents of an access token.
///
/// Produced by the validator, consumed by the identity translator. Never
/// persisted; lives only for one message's traversal of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    pub issuer: String,
    pub subject: String,
    pub scopes: Vec<String>,
    /// `exp`, seconds since epoch
    pub expires_at: u64,
    /// `iat`, seconds since epoch
    pub issued_at: Option<u64>,
    /// Claims beyond the registered set, kept as raw JSON values
    pub extra: HashMap<String, serde_json::Value>,
}

impl ClaimSet {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Wire-shape claims as deserialized by jsonwebtoken.
///
/// `sub` is optional here so its absence maps to a validation error rather
/// than an opaque deserialization failure. `scope` stays a raw value: both
/// a space-separated string and a JSON array appear in the wild.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    pub iss: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub scope: serde_json::Value,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

pub(crate) fn parse_scopes(scope: &serde_json::Value) -> Vec<String> {
    match scope {
        serde_json::Value::String(s) => s.split_whitespace().map(|s| s.to_string()).collect(),
        serde_json::Value::Array(values) => values
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}
