//! Error types for BuildLens operations

use thiserror::Error;

/// Failure of a list or indicators fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Connection failed: {message}")]
    Connect { message: String },

    #[error("Invalid response: {reason}")]
    Decode { reason: String },
}

impl FetchError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// The "service temporarily unavailable" class: gateway errors and
    /// transport-level connect/timeout failures. Shared by the primary stream
    /// and the indicators sidecar.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => matches!(status, 502..=504),
            FetchError::Timeout { .. } | FetchError::Connect { .. } => true,
            FetchError::Decode { .. } => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

// =============================================================================
// TESTS
// =============================================================================
