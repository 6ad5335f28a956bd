//! Preset tabs derived from the committed filters.
//!
//! The active tab is never stored. It is recomputed from [`FilterState`] on
//! every URL change by walking the presets in priority order.

use crate::filter::{FilterState, FilterValue, CI_FILTER, CURRENT_USER, USER_FILTER};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabId {
    MineCi,
    Mine,
    Ci,
    All,
}

impl TabId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabId::MineCi => "mine_ci",
            TabId::Mine => "mine",
            TabId::Ci => "ci",
            TabId::All => "all",
        }
    }
}

/// One named filter shortcut.
///
/// Each declared entry either requires a value (`Some`) or requires the
/// filter to be absent (`None`). Undeclared filters are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabPreset {
    pub id: TabId,
    pub label: String,
    pub filters: Vec<(String, Option<FilterValue>)>,
    pub empty_message: String,
}

impl TabPreset {
    pub fn matches(&self, state: &FilterState) -> bool {
        self.filters
            .iter()
            .all(|(key, expected)| state.get(key) == expected.as_ref())
    }

    /// `state` with exactly this preset's declared keys replaced.
    pub fn apply_to(&self, state: &FilterState) -> FilterState {
        let mut next = state.clone();
        for (key, value) in &self.filters {
            match value {
                Some(value) => next.insert(key.clone(), value.clone()),
                None => {
                    next.remove(key);
                }
            }
        }
        next
    }
}

/// Outcome of classifying a filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabResolution<'a> {
    pub preset: &'a TabPreset,
    /// `false` when no preset matched and the catch-all was chosen.
    pub exact: bool,
}

#[derive(Debug, Clone)]
pub struct TabResolver {
    presets: Vec<TabPreset>,
    catch_all: TabPreset,
}

impl TabResolver {
    /// `presets` are evaluated in order; `catch_all` wins when none match.
    /// The catch-all may also appear in `presets` to be matchable exactly.
    pub fn new(presets: Vec<TabPreset>, catch_all: TabPreset) -> Self {
        Self { presets, catch_all }
    }

    /// Presets of the build list: mine+CI, mine, CI-only, all.
    pub fn builds() -> Self {
        let me = || Some(FilterValue::text(CURRENT_USER));
        let on_ci = || Some(FilterValue::text("true"));
        let all = TabPreset {
            id: TabId::All,
            label: "All Builds".to_string(),
            filters: vec![(USER_FILTER.to_string(), None), (CI_FILTER.to_string(), None)],
            empty_message: "No builds match these filters.".to_string(),
        };
        Self::new(
            vec![
                TabPreset {
                    id: TabId::MineCi,
                    label: "My CI Builds".to_string(),
                    filters: vec![(USER_FILTER.to_string(), me()), (CI_FILTER.to_string(), on_ci())],
                    empty_message: "You have no CI builds matching these filters.".to_string(),
                },
                TabPreset {
                    id: TabId::Mine,
                    label: "My Builds".to_string(),
                    filters: vec![(USER_FILTER.to_string(), me()), (CI_FILTER.to_string(), None)],
                    empty_message: "You have no builds matching these filters.".to_string(),
                },
                TabPreset {
                    id: TabId::Ci,
                    label: "CI Builds".to_string(),
                    filters: vec![(USER_FILTER.to_string(), None), (CI_FILTER.to_string(), on_ci())],
                    empty_message: "No CI builds match these filters.".to_string(),
                },
                all.clone(),
            ],
            all,
        )
    }

    pub fn presets(&self) -> &[TabPreset] {
        &self.presets
    }

    pub fn preset(&self, id: TabId) -> Option<&TabPreset> {
        self.presets
            .iter()
            .chain(std::iter::once(&self.catch_all))
            .find(|p| p.id == id)
    }

    pub fn resolve(&self, state: &FilterState) -> TabId {
        self.resolve_match(state).preset.id
    }

    pub fn resolve_match(&self, state: &FilterState) -> TabResolution<'_> {
        match self.presets.iter().find(|p| p.matches(state)) {
            Some(preset) => TabResolution {
                preset,
                exact: true,
            },
            None => TabResolution {
                preset: &self.catch_all,
                exact: false,
            },
        }
    }

    /// Filters after clicking tab `id`; unknown ids leave `state` as is.
    pub fn select(&self, state: &FilterState, id: TabId) -> FilterState {
        match self.preset(id) {
            Some(preset) => preset.apply_to(state),
            None => state.clone(),
        }
    }

    pub fn empty_message(&self, state: &FilterState) -> &str {
        &self.resolve_match(state).preset.empty_message
    }
}
