//! Error types for the client.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid header value: {0}")]
    Header(String),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid arguments: {0}")]
    Usage(String),
    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),
}
