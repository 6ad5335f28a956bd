//! Tracing subscriber setup for the binary.

use crate::config::LogFormat;
use crate::error::ClientError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "BUILDLENS_LOG";

pub const DEFAULT_FILTER: &str = "buildlens_stream=info,buildlens_client=info,warn";

/// `BUILDLENS_LOG`, then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for the rendered list.
pub fn init_tracing(format: LogFormat) -> Result<(), ClientError> {
    let registry = tracing_subscriber::registry().with(env_filter());
    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    result.map_err(|e| ClientError::Telemetry(e.to_string()))?;

    tracing::debug!(format = ?format, "Tracing initialized");
    Ok(())
}
