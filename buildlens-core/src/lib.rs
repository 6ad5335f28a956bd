//! BuildLens Core - Entity Types
//!
//! Plain data structures shared by every other crate in the workspace:
//! build records, result pages, indicator snapshots, the fetch error
//! taxonomy and the retry policy. No I/O lives here.

pub mod build;
pub mod error;
pub mod indicators;
pub mod retry;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use build::{BuildRecord, BuildStatus, ResultPage};
pub use error::{FetchError, ValidationError};
pub use indicators::{IndicatorsResponse, IndicatorsSnapshot};
pub use retry::RetryPolicy;

/// 1-based page number as reported by the list endpoint.
pub type PageNumber = u32;

/// Organization + repository pair every list query is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub organization: String,
    pub repository: String,
}

impl Scope {
    pub fn new(organization: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            repository: repository.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_display() {
        let scope = Scope::new("acme", "rocket");
        assert_eq!(scope.to_string(), "acme/rocket");
    }
}
