//! Build records and the paginated list payload.

use crate::PageNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CI status of a single build. Values the server adds later land in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Success,
    Failure,
    Cancelled,
    Running,
    Queued,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Success => "success",
            BuildStatus::Failure => "failure",
            BuildStatus::Cancelled => "cancelled",
            BuildStatus::Running => "running",
            BuildStatus::Queued => "queued",
            BuildStatus::Unknown => "unknown",
        }
    }

}

/// One row of the build list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: String,
    pub number: u64,
    pub status: BuildStatus,
    pub branch: String,
    pub commit_sha: String,
    pub author: String,
    /// `true` when the build ran on CI rather than a developer machine.
    #[serde(default)]
    pub is_ci: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

/// One page of the list endpoint's response.
///
/// `total_pages` and `max_pages` are sourced independently by the server:
/// the first is how many pages exist, the second how many may be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub results: Vec<BuildRecord>,
    pub total_pages: PageNumber,
    pub max_pages: PageNumber,
    pub page: PageNumber,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
