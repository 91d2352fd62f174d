use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use thiserror::Error;

use crate::auth::claims::{parse_scopes, ClaimSet, RawClaims};
use crate::auth::keys::KeySource;
use crate::config::AuthConfig;
use crate::utils::log_safe_id;

/// A bearer token failed validation.
///
/// `KeyFetchFailure` is transient (the key-material source was unreachable)
/// and the next message retries; every other kind is a property of the token
/// itself. Display output never includes token contents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token signature could not be verified")]
    SignatureInvalid,
    #[error("token is expired")]
    Expired,
    #[error("token issuer is not trusted")]
    IssuerMismatch,
    #[error("signing keys unavailable: {0}")]
    KeyFetchFailure(String),
}

/// Verifies a bearer token's signature and claims against the trusted
/// issuer's key material.
///
/// Validation steps, all of which must pass: the signature verifies against
/// the issuer's current keys, `exp` is in the future (with configured
/// leeway), and `iss` matches the trusted issuer.
pub struct TokenValidator {
    keys: Arc<dyn KeySource>,
    trusted_issuer: String,
    allowed_algorithms: Vec<Algorithm>,
    leeway_secs: u64,
    hash_salt: String,
}

impl TokenValidator {
    pub fn new(
        keys: Arc<dyn KeySource>,
        trusted_issuer: &str,
        allowed_algorithms: Vec<Algorithm>,
        leeway_secs: u64,
        hash_salt: &str,
    ) -> Self {
        Self {
            keys,
            trusted_issuer: trusted_issuer.to_string(),
            allowed_algorithms,
            leeway_secs,
            hash_salt: hash_salt.to_string(),
        }
    }

    pub fn from_config(keys: Arc<dyn KeySource>, auth: &AuthConfig, hash_salt: &str) -> Self {
        let allowed_algorithms = auth
            .allowed_algorithms
            .iter()
            .filter_map(|name| Algorithm::from_str(name).ok())
            .collect();
        Self::new(
            keys,
            &auth.issuer_uri,
            allowed_algorithms,
            auth.leeway_secs,
            hash_salt,
        )
    }

    /// Validate a bearer token and return its verified claim set.
    ///
    /// An empty string is a precondition violation (the pipeline rejects
    /// blank credentials before ever calling this), surfaced as
    /// `MalformedToken` rather than a signature failure.
    pub async fn validate(&self, token: &str) -> Result<ClaimSet, ValidationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ValidationError::MalformedToken("empty token".into()));
        }

        let header = decode_header(token)
            .map_err(|e| ValidationError::MalformedToken(e.to_string()))?;

        // The algorithm comes from the (unverified) token header; an
        // allowlist keeps a forged header from downgrading verification.
        if !self.allowed_algorithms.contains(&header.alg) {
            return Err(ValidationError::SignatureInvalid);
        }

        let key = self.keys.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.trusted_issuer]);
        validation.leeway = self.leeway_secs;
        validation.validate_aud = false;

        let data = decode::<RawClaims>(token, &key, &validation).map_err(map_jwt_error)?;
        let raw = data.claims;

        let subject = raw
            .sub
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ValidationError::MalformedToken("missing subject claim".into()))?;

        tracing::debug!(
            subject_hash = %log_safe_id(&subject, &self.hash_salt),
            token_hash = %log_safe_id(token, &self.hash_salt),
            "token validated"
        );

        Ok(ClaimSet {
            issuer: raw.iss,
            subject,
            scopes: parse_scopes(&raw.scope),
            expires_at: raw.exp,
            issued_at: raw.iat,
            extra: raw.extra,
        })
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> ValidationError {
    match err.kind() {
        ErrorKind::ExpiredSignature => ValidationError::Expired,
        ErrorKind::InvalidIssuer => ValidationError::IssuerMismatch,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            ValidationError::SignatureInvalid
        }
        ErrorKind::MissingRequiredClaim(claim) if claim.as_str() == "iss" => {
            ValidationError::IssuerMismatch
        }
        _ => ValidationError::MalformedToken(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::StaticKeySource;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"relay-test-secret";
    const ISSUER: &str = "https://issuer.example";

    fn validator() -> TokenValidator {
        TokenValidator::new(
            Arc::new(StaticKeySource::from_secret(SECRET)),
            ISSUER,
            vec![Algorithm::HS256],
            0,
            "test-salt",
        )
    }

    fn mint(claims: serde_json::Value) -> String {
        mint_with(claims, SECRET)
    }

    fn mint_with(claims: serde_json::Value, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn future_exp() -> u64 {
        4_102_444_800 // 2100-01-01
    }

    #[tokio::test]
    async fn valid_token_yields_claim_set() {
        let token = mint(serde_json::json!({
            "iss": ISSUER, "sub": "alice", "exp": future_exp(), "scope": "user.read"
        }));
        let claims = validator().validate(&token).await.unwrap();
        assert_eq!(claims.subject, "alice");
        assert_eq!(claims.issuer, ISSUER);
        assert!(claims.has_scope("user.read"));
    }

    #[tokio::test]
    async fn validation_is_idempotent() {
        let token = mint(serde_json::json!({
            "iss": ISSUER, "sub": "alice", "exp": future_exp(), "scope": "user.read"
        }));
        let v = validator();
        let first = v.validate(&token).await.unwrap();
        let second = v.validate(&token).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_token_is_a_precondition_violation() {
        let err = validator().validate("   ").await.unwrap_err();
        assert!(matches!(err, ValidationError::MalformedToken(_)));
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let err = validator().validate("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, ValidationError::MalformedToken(_)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = mint(serde_json::json!({
            "iss": ISSUER, "sub": "alice", "exp": 1_000_000_000u64
        }));
        let err = validator().validate(&token).await.unwrap_err();
        assert_eq!(err, ValidationError::Expired);
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let token = mint(serde_json::json!({
            "iss": "https://other.example", "sub": "alice", "exp": future_exp()
        }));
        let err = validator().validate(&token).await.unwrap_err();
        assert_eq!(err, ValidationError::IssuerMismatch);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected() {
        let token = mint_with(
            serde_json::json!({"iss": ISSUER, "sub": "alice", "exp": future_exp()}),
            b"some-other-secret",
        );
        let err = validator().validate(&token).await.unwrap_err();
        assert_eq!(err, ValidationError::SignatureInvalid);
    }

    #[tokio::test]
    async fn disallowed_algorithm_is_rejected() {
        let v = TokenValidator::new(
            Arc::new(StaticKeySource::from_secret(SECRET)),
            ISSUER,
            vec![Algorithm::RS256],
            0,
            "test-salt",
        );
        let token = mint(serde_json::json!({
            "iss": ISSUER, "sub": "alice", "exp": future_exp()
        }));
        let err = v.validate(&token).await.unwrap_err();
        assert_eq!(err, ValidationError::SignatureInvalid);
    }

    #[tokio::test]
    async fn missing_subject_is_rejected() {
        let token = mint(serde_json::json!({"iss": ISSUER, "exp": future_exp()}));
        let err = validator().validate(&token).await.unwrap_err();
        assert!(matches!(err, ValidationError::MalformedToken(_)));
    }

    #[test]
    fn error_display_never_leaks_reasons_with_token_text() {
        assert_eq!(
            ValidationError::SignatureInvalid.to_string(),
            "token signature could not be verified"
        );
        assert_eq!(
            ValidationError::IssuerMismatch.to_string(),
            "token issuer is not trusted"
        );
    }
}
