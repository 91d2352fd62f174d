use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::{ClientCredentials, Config};
use crate::utils::log_safe_id;

/// Producer-side token fetch failed. Aborts only the current send; there is
/// no retry logic here.
#[derive(Debug, Error)]
pub enum AuthServerError {
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token endpoint returned HTTP {0}")]
    Status(u16),
    #[error("token response body is malformed: {0}")]
    MalformedBody(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client-credentials exchange against the issuer's token endpoint.
///
/// Sends HTTP Basic client credentials and a fixed scope; requires a 2xx
/// response carrying a JSON `access_token` field.
pub struct TokenClient {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    scope: String,
    hash_salt: String,
}

impl TokenClient {
    pub fn new(
        token_endpoint: &str,
        credentials: &ClientCredentials,
        scope: &str,
        http_timeout: Duration,
        hash_salt: &str,
    ) -> Result<Self, AuthServerError> {
        let http = reqwest::Client::builder().timeout(http_timeout).build()?;
        Ok(Self {
            http,
            token_endpoint: token_endpoint.to_string(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            scope: scope.to_string(),
            hash_salt: hash_salt.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AuthServerError> {
        let credentials = config.credentials.as_ref().ok_or_else(|| {
            AuthServerError::MalformedBody("client credentials not configured".into())
        })?;
        Self::new(
            &config.token_endpoint,
            credentials,
            &config.token_scope,
            Duration::from_secs(config.auth.http_timeout_secs),
            &config.log_hash_salt,
        )
    }

    /// Perform the client-credentials token request.
    pub async fn fetch_token(&self) -> Result<String, AuthServerError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthServerError::Status(status.as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthServerError::MalformedBody(e.to_string()))?;

        if body.access_token.trim().is_empty() {
            return Err(AuthServerError::MalformedBody("empty access_token".into()));
        }

        tracing::debug!(
            token_hash = %log_safe_id(&body.access_token, &self.hash_salt),
            scope = %self.scope,
            "obtained access token"
        );

        Ok(body.access_token)
    }
}
