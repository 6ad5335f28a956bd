//! BuildLens Client
//!
//! REST transport implementing `BuildSource`, configuration loading, logging
//! setup and text rendering for the `buildlens` binary.

pub mod api_client;
pub mod cli;
pub mod config;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api_client::RestClient;
pub use cli::CliArgs;
pub use config::{AuthConfig, ClientConfig, ConfigError, LogFormat};
pub use error::ClientError;
