//! Transport seam between the engine and whatever serves build pages.

use async_trait::async_trait;
use buildlens_core::{FetchError, IndicatorsSnapshot, PageNumber, ResultPage, Scope};

/// One page request: scope, canonical filter/sort parameters and the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub scope: Scope,
    pub params: Vec<(String, String)>,
    pub page: PageNumber,
}

impl PageRequest {
    pub fn new(scope: Scope, params: Vec<(String, String)>, page: PageNumber) -> Self {
        Self {
            scope,
            params,
            page,
        }
    }

    /// First value of `key` among the filter/sort parameters.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parameters plus `page`, as sent on the wire.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.params.clone();
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs
    }
}

/// Source of build pages and per-page indicators.
///
/// Both calls are idempotent reads; the engine may issue them again for the
/// same request on retry.
#[async_trait]
pub trait BuildSource: Send + Sync {
    async fn list_builds(&self, request: &PageRequest) -> Result<ResultPage, FetchError>;

    async fn indicators(&self, request: &PageRequest) -> Result<IndicatorsSnapshot, FetchError>;
}
