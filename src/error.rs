use thiserror::Error;

use crate::auth::token_client::AuthServerError;
use crate::auth::validator::ValidationError;
use crate::config::ConfigError;

pub type AppResult<T> = Result<T, AppError>;

/// Top-level application error.
///
/// Inbound-pipeline failures never appear here: they are terminal for a
/// single message and reported through the audit sink instead. This type
/// covers the failures that surface to a caller or abort startup.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("token validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Producer-side token fetch failed; aborts only the current send
    #[error("authorization server error: {0}")]
    AuthServer(#[from] AuthServerError),

    #[error("broker error: {0}")]
    Broker(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
