//! Configuration loading for the BuildLens client.
//!
//! All fields are required unless explicitly marked optional.

use buildlens_core::{RetryPolicy, Scope, ValidationError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const CONFIG_ENV: &str = "BUILDLENS_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub organization: String,
    pub repository: String,
    #[serde(default)]
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Sent as `Authorization: Bearer <token>`.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or BUILDLENS_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ClientConfig {
    /// Load from `path`, or from `BUILDLENS_CONFIG` when no path was given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(config_path_from_env)
            .ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        match Url::parse(&self.api_base_url) {
            Ok(url) if url.cannot_be_a_base() => {
                return Err(ConfigError::InvalidValue {
                    field: "api_base_url",
                    reason: "must be an absolute http(s) URL".to_string(),
                });
            }
            Ok(_) => {}
            Err(err) => {
                return Err(ConfigError::InvalidValue {
                    field: "api_base_url",
                    reason: err.to_string(),
                });
            }
        }
        if self.organization.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "organization",
                reason: "must not be empty".to_string(),
            });
        }
        if self.repository.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "repository",
                reason: "must not be empty".to_string(),
            });
        }
        if self
            .auth
            .token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "auth.token",
                reason: "must not be blank when set".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        self.retry.validate()?;
        Ok(())
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.organization.trim(), self.repository.trim())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}
