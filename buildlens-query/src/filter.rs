//! Filter schema, values and the committed filter state.
//!
//! Every filter has a declared kind. Values are a tagged union over those
//! kinds so encoding, decoding and comparison are kind-specific instead of
//! going through one dynamically-typed slot.

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape of a filter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Text,
    MultiSelect,
    Range,
}

/// A filter value. Range bounds are independently optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    MultiSelect(Vec<String>),
    Range(Option<i64>, Option<i64>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelect(values.into_iter().map(Into::into).collect())
    }

    pub fn range(min: Option<i64>, max: Option<i64>) -> Self {
        Self::Range(min, max)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Text,
            FilterValue::MultiSelect(_) => FilterKind::MultiSelect,
            FilterValue::Range(_, _) => FilterKind::Range,
        }
    }

    /// Human-readable rendering used for filter chips.
    pub fn display(&self) -> String {
        match self {
            FilterValue::Text(value) => value.clone(),
            FilterValue::MultiSelect(values) => values.join(", "),
            FilterValue::Range(Some(min), Some(max)) => format!("{min}–{max}"),
            FilterValue::Range(Some(min), None) => format!("≥ {min}"),
            FilterValue::Range(None, Some(max)) => format!("≤ {max}"),
            FilterValue::Range(None, None) => String::new(),
        }
    }
}

/// Declaration of one filter the list understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDef {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    /// Text value meaning "not applied" in addition to the empty string,
    /// e.g. `any` for a select rendered as text.
    pub no_value: Option<String>,
}

impl FilterDef {
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::Text)
    }

    pub fn multi(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::MultiSelect)
    }

    pub fn range(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FilterKind::Range)
    }

    fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            no_value: None,
        }
    }

    pub fn with_no_value(mut self, sentinel: impl Into<String>) -> Self {
        self.no_value = Some(sentinel.into());
        self
    }

    /// The value this filter takes when it is not applied.
    pub fn sentinel(&self) -> FilterValue {
        match self.kind {
            FilterKind::Text => FilterValue::Text(self.no_value.clone().unwrap_or_default()),
            FilterKind::MultiSelect => FilterValue::MultiSelect(Vec::new()),
            FilterKind::Range => FilterValue::Range(None, None),
        }
    }

    fn is_no_value_text(&self, value: &str) -> bool {
        value.trim().is_empty() || self.no_value.as_deref() == Some(value)
    }

    /// Canonical form of `value`, or `None` when it is the sentinel.
    ///
    /// Multi-select entries are de-duplicated in first-seen order and empty
    /// entries dropped.
    pub fn normalize(&self, value: &FilterValue) -> Result<Option<FilterValue>, QueryError> {
        if value.kind() != self.kind {
            return Err(QueryError::KindMismatch {
                key: self.key.clone(),
                expected: self.kind,
                got: value.kind(),
            });
        }

        let normalized = match value {
            FilterValue::Text(text) => {
                (!self.is_no_value_text(text)).then(|| FilterValue::Text(text.clone()))
            }
            FilterValue::MultiSelect(values) => {
                let mut kept: Vec<String> = Vec::with_capacity(values.len());
                for item in values {
                    if self.is_no_value_text(item) || kept.contains(item) {
                        continue;
                    }
                    kept.push(item.clone());
                }
                (!kept.is_empty()).then_some(FilterValue::MultiSelect(kept))
            }
            FilterValue::Range(None, None) => None,
            FilterValue::Range(min, max) => Some(FilterValue::Range(*min, *max)),
        };
        Ok(normalized)
    }
}

/// Committed (or drafted) filter values keyed by filter name.
///
/// Holds only applied filters: sentinel values are removed rather than stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    values: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FilterValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.values.iter()
    }
}

/// The set of filters, sortable columns and view-state parameters a list
/// accepts. Anything outside the schema is dropped when decoding a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSchema {
    filters: Vec<FilterDef>,
    sortable: Vec<String>,
    view_params: Vec<String>,
}

impl FilterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, def: FilterDef) -> Self {
        self.filters.push(def);
        self
    }

    pub fn sortable(mut self, column: impl Into<String>) -> Self {
        self.sortable.push(column.into());
        self
    }

    pub fn view_param(mut self, key: impl Into<String>) -> Self {
        self.view_params.push(key.into());
        self
    }

    /// Schema of the CI build list.
    pub fn builds() -> Self {
        Self::new()
            .filter(FilterDef::text(USER_FILTER, "Triggered by"))
            .filter(FilterDef::text(CI_FILTER, "Environment").with_no_value("any"))
            .filter(FilterDef::multi("status", "Status"))
            .filter(FilterDef::text("branch", "Branch"))
            .filter(FilterDef::range("duration", "Duration (s)"))
            .filter(FilterDef::text("query", "Search"))
            .sortable("created_at")
            .sortable("duration")
            .sortable("number")
            .sortable("status")
            .sortable("branch")
            .view_param(BUILD_PARAM)
            .view_param(DETAIL_TAB_PARAM)
    }

    pub fn filters(&self) -> &[FilterDef] {
        &self.filters
    }

    pub fn def(&self, key: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|def| def.key == key)
    }

    pub fn sortable_columns(&self) -> &[String] {
        &self.sortable
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.iter().any(|c| c == column)
    }

    pub fn view_params(&self) -> &[String] {
        &self.view_params
    }

    pub fn is_view_param(&self, key: &str) -> bool {
        self.view_params.iter().any(|k| k == key)
    }

    /// Normalize `value` against the declaration of `key`.
    pub fn normalize(
        &self,
        key: &str,
        value: &FilterValue,
    ) -> Result<Option<FilterValue>, QueryError> {
        let def = self.def(key).ok_or_else(|| QueryError::UnknownFilter {
            key: key.to_string(),
        })?;
        def.normalize(value)
    }

    /// Set `key` on `state`, removing it when `value` is the sentinel.
    pub fn assign(
        &self,
        state: &mut FilterState,
        key: &str,
        value: &FilterValue,
    ) -> Result<(), QueryError> {
        match self.normalize(key, value)? {
            Some(value) => state.insert(key, value),
            None => {
                state.remove(key);
            }
        }
        Ok(())
    }
}

/// "Triggered by" filter; `me` selects the current user's builds.
pub const USER_FILTER: &str = "user";
/// Value of [`USER_FILTER`] for the signed-in user.
pub const CURRENT_USER: &str = "me";
/// CI-vs-local filter; `true` selects builds that ran on CI.
pub const CI_FILTER: &str = "ci";
/// View-state parameter holding the build opened in the detail panel.
pub const BUILD_PARAM: &str = "build";
/// View-state parameter holding the detail panel's sub-tab.
pub const DETAIL_TAB_PARAM: &str = "tab";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_sentinels_normalize_to_none() {
        let def = FilterDef::text("ci", "Environment").with_no_value("any");
        assert_eq!(def.normalize(&FilterValue::text("")).unwrap(), None);
        assert_eq!(def.normalize(&FilterValue::text("   ")).unwrap(), None);
        assert_eq!(def.normalize(&FilterValue::text("any")).unwrap(), None);
        assert_eq!(
            def.normalize(&FilterValue::text("true")).unwrap(),
            Some(FilterValue::text("true"))
        );
        assert_eq!(def.sentinel(), FilterValue::text("any"));
    }

    #[test]
    fn test_multi_select_dedupes_and_drops_empty() {
        let def = FilterDef::multi("status", "Status");
        let value = FilterValue::multi(["failure", "", "success", "failure"]);
        assert_eq!(
            def.normalize(&value).unwrap(),
            Some(FilterValue::multi(["failure", "success"]))
        );
        assert_eq!(def.normalize(&FilterValue::multi(Vec::<String>::new())).unwrap(), None);
    }

    #[test]
    fn test_range_with_one_bound_is_kept() {
        let def = FilterDef::range("duration", "Duration");
        assert_eq!(
            def.normalize(&FilterValue::range(None, Some(60))).unwrap(),
            Some(FilterValue::range(None, Some(60)))
        );
        assert_eq!(def.normalize(&FilterValue::range(None, None)).unwrap(), None);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let def = FilterDef::range("duration", "Duration");
        let err = def.normalize(&FilterValue::text("10")).unwrap_err();
        assert!(matches!(err, QueryError::KindMismatch { .. }));
    }

    #[test]
    fn test_assign_removes_sentinel() {
        let schema = FilterSchema::builds();
        let mut state = FilterState::new().with("branch", FilterValue::text("main"));
        schema
            .assign(&mut state, "branch", &FilterValue::text(""))
            .unwrap();
        assert!(state.is_empty());

        let err = schema
            .assign(&mut state, "nope", &FilterValue::text("x"))
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownFilter { .. }));
    }

    #[test]
    fn test_display_values() {
        assert_eq!(FilterValue::multi(["a", "b"]).display(), "a, b");
        assert_eq!(FilterValue::range(Some(1), None).display(), "≥ 1");
        assert_eq!(FilterValue::range(None, Some(9)).display(), "≤ 9");
    }

    #[test]
    fn test_builds_schema_declarations() {
        let schema = FilterSchema::builds();
        assert!(schema.is_sortable("duration"));
        assert!(!schema.is_sortable("author"));
        assert!(schema.is_view_param(DETAIL_TAB_PARAM));
        assert_eq!(schema.def("duration").map(|d| d.kind), Some(FilterKind::Range));
    }
}
