// ============================================================================
// Issuer Key Material
// ============================================================================
//
// The validator verifies signatures against the issuer's published key set.
// Key material is the only shared resource in the pipeline: read-mostly,
// cached with a TTL, refreshed at most once per lookup when a key id is
// unknown. A fetch failure is transient - it surfaces as KeyFetchFailure
// for the current message and the next message retries.
//
// ============================================================================

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::auth::validator::ValidationError;

/// Source of token-verification keys.
///
/// Replaceable seam: production uses [`RemoteKeySet`] against the issuer's
/// published JWKS; tests substitute [`StaticKeySource`].
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Resolve the decoding key for a token, by key id when present.
    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, ValidationError>;
}

/// OIDC discovery document, reduced to the field the key fetch needs.
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// JWKS fetched from the issuer's published location, cached with a TTL.
///
/// The JWKS URI is discovered from `{issuer}/.well-known/openid-configuration`
/// on first use. Refresh is safe under concurrent readers and bounded by the
/// HTTP client timeout, so a slow issuer stalls one message, not the loop.
pub struct RemoteKeySet {
    http: reqwest::Client,
    issuer_uri: String,
    cache_ttl: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

impl RemoteKeySet {
    pub fn new(
        issuer_uri: &str,
        http_timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self, ValidationError> {
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .map_err(|e| ValidationError::KeyFetchFailure(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            issuer_uri: issuer_uri.trim_end_matches('/').to_string(),
            cache_ttl,
            cached: RwLock::new(None),
        })
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, ValidationError> {
        let discovery_url = format!("{}/.well-known/openid-configuration", self.issuer_uri);

        tracing::debug!(url = %discovery_url, "fetching issuer discovery document");

        let discovery: DiscoveryDocument = self
            .get_json(&discovery_url)
            .await
            .map_err(|e| ValidationError::KeyFetchFailure(format!("discovery: {}", e)))?;

        let keys: JwkSet = self
            .get_json(&discovery.jwks_uri)
            .await
            .map_err(|e| ValidationError::KeyFetchFailure(format!("jwks: {}", e)))?;

        tracing::info!(
            issuer = %self.issuer_uri,
            key_count = keys.keys.len(),
            "refreshed issuer signing keys"
        );

        Ok(keys)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        let response = self.http.get(url).send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        response.json::<T>().await.map_err(|e| e.to_string())
    }

    /// Refresh the cache and return the new key set.
    async fn refresh(&self) -> Result<JwkSet, ValidationError> {
        let keys = self.fetch_jwks().await?;
        let mut cached = self.cached.write().await;
        *cached = Some(CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    async fn current(&self) -> Option<JwkSet> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.cache_ttl)
            .map(|c| c.keys.clone())
    }

    fn select_key(keys: &JwkSet, kid: Option<&str>) -> Option<DecodingKey> {
        let jwk = match kid {
            Some(kid) => keys.find(kid),
            // No key id on the token: unambiguous only with a single key
            None if keys.keys.len() == 1 => keys.keys.first(),
            None => None,
        }?;
        DecodingKey::from_jwk(jwk).ok()
    }
}

#[async_trait]
impl KeySource for RemoteKeySet {
    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, ValidationError> {
        if let Some(keys) = self.current().await {
            if let Some(key) = Self::select_key(&keys, kid) {
                return Ok(key);
            }
            tracing::info!(kid = ?kid, "key not in cached JWKS, forcing refresh");
        }

        let keys = self.refresh().await?;
        Self::select_key(&keys, kid).ok_or_else(|| ValidationError::SignatureInvalid)
    }
}

/// Fixed-key source for tests and single-key deployments.
pub struct StaticKeySource {
    key: DecodingKey,
    pub algorithm: Algorithm,
}

impl StaticKeySource {
    pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        Self { key, algorithm }
    }

    /// HMAC variant, the convenient shape for test tokens.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret), Algorithm::HS256)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn decoding_key(&self, _kid: Option<&str>) -> Result<DecodingKey, ValidationError> {
        Ok(self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwk_set(json: serde_json::Value) -> JwkSet {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn select_key_by_kid() {
        let keys = jwk_set(serde_json::json!({
            "keys": [
                {"kty": "oct", "kid": "a", "k": "c2VjcmV0LWE"},
                {"kty": "oct", "kid": "b", "k": "c2VjcmV0LWI"}
            ]
        }));
        assert!(RemoteKeySet::select_key(&keys, Some("b")).is_some());
        assert!(RemoteKeySet::select_key(&keys, Some("missing")).is_none());
    }

    #[test]
    fn select_without_kid_requires_single_key() {
        let one = jwk_set(serde_json::json!({
            "keys": [{"kty": "oct", "kid": "a", "k": "c2VjcmV0LWE"}]
        }));
        let two = jwk_set(serde_json::json!({
            "keys": [
                {"kty": "oct", "kid": "a", "k": "c2VjcmV0LWE"},
                {"kty": "oct", "kid": "b", "k": "c2VjcmV0LWI"}
            ]
        }));
        assert!(RemoteKeySet::select_key(&one, None).is_some());
        assert!(RemoteKeySet::select_key(&two, None).is_none());
    }

    #[tokio::test]
    async fn unreachable_issuer_is_a_transient_failure() {
        let keys = RemoteKeySet::new(
            "http://127.0.0.1:1",
            Duration::from_millis(200),
            Duration::from_secs(300),
        )
        .unwrap();

        let err = keys.decoding_key(Some("a")).await.err().expect("expected Err");
        assert!(matches!(err, ValidationError::KeyFetchFailure(_)));

        // Failure is not cached: the next lookup tries the network again
        let err = keys.decoding_key(Some("a")).await.err().expect("expected Err");
        assert!(matches!(err, ValidationError::KeyFetchFailure(_)));
    }
}
