//! Sub-tab of the build detail panel, carried as view state in the URL.

use crate::codec::{QueryState, QueryStateCodec};
use crate::filter::DETAIL_TAB_PARAM;
use crate::location::Navigation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailTab {
    #[default]
    Logs,
    Tests,
    Metrics,
}

impl DetailTab {
    pub fn all() -> &'static [DetailTab] {
        &[DetailTab::Logs, DetailTab::Tests, DetailTab::Metrics]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailTab::Logs => "logs",
            DetailTab::Tests => "tests",
            DetailTab::Metrics => "metrics",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tab| tab.as_str() == value)
    }
}

/// Active sub-tab, plus a replace-navigation to the default tab when the URL
/// is missing or carries an unknown value.
pub fn resolve_detail_tab(
    codec: &QueryStateCodec,
    state: &QueryState,
) -> (DetailTab, Option<Navigation>) {
    if let Some(tab) = state
        .misc
        .get(DETAIL_TAB_PARAM)
        .and_then(|value| DetailTab::parse(value))
    {
        return (tab, None);
    }
    let redirected = state
        .clone()
        .with_misc(DETAIL_TAB_PARAM, DetailTab::default().as_str());
    (
        DetailTab::default(),
        Some(Navigation::Replace(codec.encode(&redirected))),
    )
}

/// Navigation for clicking a sub-tab.
pub fn select_detail_tab(codec: &QueryStateCodec, state: &QueryState, tab: DetailTab) -> Navigation {
    let next = state.clone().with_misc(DETAIL_TAB_PARAM, tab.as_str());
    Navigation::Replace(codec.encode(&next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSchema;
    use std::sync::Arc;

    fn codec() -> QueryStateCodec {
        QueryStateCodec::new(Arc::new(FilterSchema::builds()))
    }

    #[test]
    fn test_known_tab_needs_no_redirect() {
        let c = codec();
        let state = c.decode("build=b-1&tab=metrics");
        assert_eq!(resolve_detail_tab(&c, &state), (DetailTab::Metrics, None));
    }

    #[test]
    fn test_missing_tab_redirects_with_replace() {
        let c = codec();
        let state = c.decode("branch=main&build=b-1");
        let (tab, nav) = resolve_detail_tab(&c, &state);
        assert_eq!(tab, DetailTab::Logs);
        assert_eq!(
            nav,
            Some(Navigation::Replace("branch=main&build=b-1&tab=logs".to_string()))
        );
    }

    #[test]
    fn test_unknown_tab_redirects() {
        let c = codec();
        let state = c.decode("tab=flamegraph");
        let (tab, nav) = resolve_detail_tab(&c, &state);
        assert_eq!(tab, DetailTab::Logs);
        assert!(matches!(nav, Some(Navigation::Replace(_))));
    }

    #[test]
    fn test_select_uses_replace() {
        let c = codec();
        let state = c.decode("tab=logs");
        assert_eq!(
            select_detail_tab(&c, &state, DetailTab::Tests),
            Navigation::Replace("tab=tests".to_string())
        );
    }
}
