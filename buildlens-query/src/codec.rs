//! Bidirectional mapping between the URL query string and [`QueryState`].
//!
//! # Parameter format
//!
//! ```text
//! text filter     key=value
//! multi-select    key=a&key=b            (order kept, duplicates dropped)
//! range           key_min=10&key_max=60  (either bound may be missing)
//! sort            sort=column | sort=-column
//! view state      declared keys only, e.g. tab=logs
//! ```
//!
//! Decoding never fails. Unknown keys, non-numeric range bounds, sort tokens
//! on undeclared columns and sentinel values are dropped. Encoding emits
//! parameters in schema order so equal states produce equal strings.

use crate::filter::{FilterDef, FilterKind, FilterSchema, FilterState, FilterValue};
use crate::sort::{decode_token, encode_token, SortState};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::form_urlencoded;

/// Query parameter carrying the sort token.
pub const SORT_PARAM: &str = "sort";

const RANGE_MIN_SUFFIX: &str = "_min";
const RANGE_MAX_SUFFIX: &str = "_max";

/// Everything a list URL encodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub filters: FilterState,
    pub sort: SortState,
    /// Pagination-irrelevant view state (e.g. the detail panel's sub-tab).
    pub misc: BTreeMap<String, String>,
}

impl QueryState {
    pub fn new(filters: FilterState, sort: SortState) -> Self {
        Self {
            filters,
            sort,
            misc: BTreeMap::new(),
        }
    }

    pub fn with_misc(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.misc.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct QueryStateCodec {
    schema: Arc<FilterSchema>,
}

impl QueryStateCodec {
    pub fn new(schema: Arc<FilterSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn decode(&self, query: &str) -> QueryState {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut raw: BTreeMap<String, FilterValue> = BTreeMap::new();
        let mut sort: Option<SortState> = None;
        let mut misc = BTreeMap::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let key: &str = &key;
            let value = value.into_owned();

            if key == SORT_PARAM {
                if sort.is_none() {
                    sort = self.decode_sort(&value);
                }
                continue;
            }

            if let Some(def) = self.schema.def(key) {
                match def.kind {
                    FilterKind::Text => {
                        raw.entry(def.key.clone())
                            .or_insert(FilterValue::Text(value));
                    }
                    FilterKind::MultiSelect => {
                        if let FilterValue::MultiSelect(values) = raw
                            .entry(def.key.clone())
                            .or_insert_with(|| FilterValue::MultiSelect(Vec::new()))
                        {
                            values.push(value);
                        }
                    }
                    // Range filters are only addressable through their bound keys.
                    FilterKind::Range => {
                        tracing::debug!(param = key, "dropping bare range parameter");
                    }
                }
                continue;
            }

            if let Some((def, is_min)) = self.range_bound(key) {
                let Ok(bound) = value.trim().parse::<i64>() else {
                    tracing::debug!(param = key, "dropping non-numeric range bound");
                    continue;
                };
                let entry = raw
                    .entry(def.key.clone())
                    .or_insert(FilterValue::Range(None, None));
                if let FilterValue::Range(min, max) = entry {
                    let slot = if is_min { min } else { max };
                    slot.get_or_insert(bound);
                }
                continue;
            }

            if self.schema.is_view_param(key) {
                if !value.is_empty() {
                    misc.entry(key.to_string()).or_insert(value);
                }
                continue;
            }

            tracing::debug!(param = key, "dropping unknown query parameter");
        }

        let mut filters = FilterState::new();
        for (key, value) in raw {
            if let Ok(Some(value)) = self.schema.normalize(&key, &value) {
                filters.insert(key, value);
            }
        }

        QueryState {
            filters,
            sort: sort.unwrap_or_default(),
            misc,
        }
    }

    pub fn encode(&self, state: &QueryState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        self.append_filters(&mut serializer, &state.filters, &state.sort);
        for key in self.schema.view_params() {
            if let Some(value) = state.misc.get(key).filter(|v| !v.is_empty()) {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Encoding of the filter and sort parts only. View state is excluded
    /// because it never changes which results are fetched.
    pub fn encode_filters(&self, filters: &FilterState, sort: &SortState) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        self.append_filters(&mut serializer, filters, sort);
        serializer.finish()
    }

    /// Filter and sort parameters as pairs, in encoding order, for handing to
    /// the transport.
    pub fn request_params(&self, filters: &FilterState, sort: &SortState) -> Vec<(String, String)> {
        let encoded = self.encode_filters(filters, sort);
        form_urlencoded::parse(encoded.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn append_filters(
        &self,
        serializer: &mut form_urlencoded::Serializer<'_, String>,
        filters: &FilterState,
        sort: &SortState,
    ) {
        for def in self.schema.filters() {
            let Some(value) = filters.get(&def.key) else {
                continue;
            };
            let Ok(Some(value)) = def.normalize(value) else {
                continue;
            };
            match value {
                FilterValue::Text(text) => {
                    serializer.append_pair(&def.key, &text);
                }
                FilterValue::MultiSelect(values) => {
                    for item in &values {
                        serializer.append_pair(&def.key, item);
                    }
                }
                FilterValue::Range(min, max) => {
                    if let Some(min) = min {
                        serializer.append_pair(&range_key(def, true), &min.to_string());
                    }
                    if let Some(max) = max {
                        serializer.append_pair(&range_key(def, false), &max.to_string());
                    }
                }
            }
        }

        if let Some(token) = encode_token(sort) {
            serializer.append_pair(SORT_PARAM, &token);
        }
    }

    fn decode_sort(&self, token: &str) -> Option<SortState> {
        let sort = decode_token(token);
        match sort.column.as_deref() {
            Some(column) if self.schema.is_sortable(column) => Some(sort),
            Some(column) => {
                tracing::debug!(column, "dropping sort on undeclared column");
                None
            }
            None => None,
        }
    }

    fn range_bound(&self, key: &str) -> Option<(&FilterDef, bool)> {
        let (base, is_min) = if let Some(base) = key.strip_suffix(RANGE_MIN_SUFFIX) {
            (base, true)
        } else if let Some(base) = key.strip_suffix(RANGE_MAX_SUFFIX) {
            (base, false)
        } else {
            return None;
        };
        self.schema
            .def(base)
            .filter(|def| def.kind == FilterKind::Range)
            .map(|def| (def, is_min))
    }
}

fn range_key(def: &FilterDef, min: bool) -> String {
    let suffix = if min { RANGE_MIN_SUFFIX } else { RANGE_MAX_SUFFIX };
    format!("{}{}", def.key, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> QueryStateCodec {
        QueryStateCodec::new(Arc::new(FilterSchema::builds()))
    }

    #[test]
    fn test_decode_all_kinds() {
        let state = codec().decode(
            "?branch=main&status=failure&status=cancelled&duration_min=60&sort=-duration&tab=tests",
        );
        assert_eq!(state.filters.get("branch"), Some(&FilterValue::text("main")));
        assert_eq!(
            state.filters.get("status"),
            Some(&FilterValue::multi(["failure", "cancelled"]))
        );
        assert_eq!(
            state.filters.get("duration"),
            Some(&FilterValue::range(Some(60), None))
        );
        assert_eq!(state.sort, SortState::desc("duration"));
        assert_eq!(state.misc.get("tab").map(String::as_str), Some("tests"));
    }

    #[test]
    fn test_decode_drops_unknown_and_malformed() {
        let state = codec().decode("bogus=1&duration_max=abc&sort=-author&utm_source=x&%zz=1");
        assert!(state.filters.is_empty());
        assert!(state.sort.is_unsorted());
        assert!(state.misc.is_empty());
    }

    #[test]
    fn test_decode_drops_sentinels() {
        let state = codec().decode("ci=any&branch=&status=");
        assert!(state.filters.is_empty());
    }

    #[test]
    fn test_range_single_bound_is_not_zero() {
        let state = codec().decode("duration_max=120");
        assert_eq!(
            state.filters.get("duration"),
            Some(&FilterValue::range(None, Some(120)))
        );
    }

    #[test]
    fn test_encode_omits_sentinels_and_unsorted() {
        let filters = FilterState::new()
            .with("ci", FilterValue::text("any"))
            .with("branch", FilterValue::text(""))
            .with("status", FilterValue::multi(Vec::<String>::new()));
        let state = QueryState::new(filters, SortState::unsorted());
        assert_eq!(codec().encode(&state), "");
    }

    #[test]
    fn test_encode_is_schema_ordered() {
        let filters = FilterState::new()
            .with("branch", FilterValue::text("release/1.0"))
            .with("user", FilterValue::text("me"))
            .with("duration", FilterValue::range(Some(5), Some(50)));
        let state = QueryState::new(filters, SortState::asc("number")).with_misc("tab", "logs");
        assert_eq!(
            codec().encode(&state),
            "user=me&branch=release%2F1.0&duration_min=5&duration_max=50&sort=number&tab=logs"
        );
    }

    #[test]
    fn test_round_trip_with_spaces_and_symbols() {
        let c = codec();
        let filters = FilterState::new()
            .with("query", FilterValue::text("fix & test = 100%"))
            .with("status", FilterValue::multi(["a b", "c+d"]));
        let state = QueryState::new(filters, SortState::desc("created_at"));
        assert_eq!(c.decode(&c.encode(&state)), state);
    }

    #[test]
    fn test_first_value_wins_for_text() {
        let state = codec().decode("branch=main&branch=dev");
        assert_eq!(state.filters.get("branch"), Some(&FilterValue::text("main")));
    }

    #[test]
    fn test_request_params_exclude_view_state() {
        let c = codec();
        let params = c.request_params(
            &FilterState::new().with("branch", FilterValue::text("main")),
            &SortState::desc("number"),
        );
        assert_eq!(
            params,
            vec![
                ("branch".to_string(), "main".to_string()),
                ("sort".to_string(), "-number".to_string()),
            ]
        );
    }
}
