// ============================================================================
// Configuration
// ============================================================================
//
// All configuration is read from the environment (with .env support for
// local development). Required values fail startup with a ConfigError that
// names the missing key; everything else has a sensible default.
//
// ============================================================================

use thiserror::Error;

// Default broker destination: durable queue name, also used as routing key
const DEFAULT_DESTINATION: &str = "requests";

// Default well-known header carrying the bearer credential on the wire
const DEFAULT_CREDENTIAL_HEADER: &str = "Authorization";

const DEFAULT_TOKEN_SCOPE: &str = "user.read";
const DEFAULT_CONSUMER_GROUP: &str = "relay-gateway";
const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";

const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOKEN_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Broker connection settings.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Comma-separated bootstrap broker list
    pub brokers: String,
    /// Topic / routing key the relay publishes to and consumes from
    pub destination: String,
    /// Consumer group id for the gateway side
    pub group_id: String,
}

/// Token validation settings for the inbound pipeline.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Trusted issuer URI; tokens whose `iss` differs are rejected
    pub issuer_uri: String,
    /// How long a fetched JWKS document stays valid before a re-fetch
    pub jwks_cache_ttl_secs: u64,
    /// Bound on key-material and token-endpoint HTTP calls
    pub http_timeout_secs: u64,
    /// Clock-skew leeway applied to `exp`
    pub leeway_secs: u64,
    /// Signature algorithms the validator accepts
    pub allowed_algorithms: Vec<String>,
}

/// Client-credentials material for the producer side. Optional: the
/// gateway consumer runs without it.
#[derive(Clone, Debug)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub broker: BrokerConfig,
    pub auth: AuthConfig,
    /// Token endpoint for client-credentials exchange (producer side)
    pub token_endpoint: String,
    /// Scope requested during client-credentials exchange
    pub token_scope: String,
    pub credentials: Option<ClientCredentials>,
    /// Header name carrying the bearer credential on the wire
    pub credential_header: String,
    /// Salt for privacy-preserving identifier hashes in logs
    pub log_hash_salt: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let issuer_uri =
            std::env::var("AUTH_ISSUER_URI").map_err(|_| ConfigError::Missing("AUTH_ISSUER_URI"))?;
        if issuer_uri.trim().is_empty() {
            return Err(ConfigError::Invalid("AUTH_ISSUER_URI"));
        }

        let token_endpoint = std::env::var("TOKEN_ENDPOINT")
            .unwrap_or_else(|_| format!("{}/oauth2/token", issuer_uri.trim_end_matches('/')));

        let credentials = match (std::env::var("CLIENT_ID"), std::env::var("CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => Some(ClientCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let allowed_algorithms = std::env::var("ALLOWED_ALGORITHMS")
            .unwrap_or_else(|_| "RS256,ES256,EdDSA".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if allowed_algorithms.is_empty() {
            return Err(ConfigError::Invalid("ALLOWED_ALGORITHMS"));
        }

        Ok(Self {
            broker: BrokerConfig {
                brokers: env_or("KAFKA_BROKERS", DEFAULT_KAFKA_BROKERS),
                destination: env_or("RELAY_DESTINATION", DEFAULT_DESTINATION),
                group_id: env_or("RELAY_CONSUMER_GROUP", DEFAULT_CONSUMER_GROUP),
            },
            auth: AuthConfig {
                issuer_uri,
                jwks_cache_ttl_secs: env_or_parse("JWKS_CACHE_TTL_SECS", DEFAULT_JWKS_CACHE_TTL_SECS),
                http_timeout_secs: env_or_parse("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
                leeway_secs: env_or_parse("TOKEN_LEEWAY_SECS", DEFAULT_TOKEN_LEEWAY_SECS),
                allowed_algorithms,
            },
            token_endpoint,
            token_scope: env_or("TOKEN_SCOPE", DEFAULT_TOKEN_SCOPE),
            credentials,
            credential_header: env_or("CREDENTIAL_HEADER", DEFAULT_CREDENTIAL_HEADER),
            log_hash_salt: env_or("LOG_HASH_SALT", "relay-dev-salt"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
