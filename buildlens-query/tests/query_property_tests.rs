use buildlens_query::{
    FilterSchema, FilterState, FilterValue, QueryState, QueryStateCodec, SortController,
    SortDirection, SortState, TabId, TabResolver, CI_FILTER, USER_FILTER,
};
use proptest::prelude::*;
use std::sync::Arc;

fn codec() -> QueryStateCodec {
    QueryStateCodec::new(Arc::new(FilterSchema::builds()))
}

// ============================================================================
// Generators
// ============================================================================

/// Text that is never a sentinel: starts with a visible character.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 &=%+/._-]{0,15}"
}

fn arb_multi() -> impl Strategy<Value = FilterValue> {
    prop::collection::btree_set(arb_text(), 1..4)
        .prop_map(|set| FilterValue::MultiSelect(set.into_iter().collect()))
}

fn arb_range() -> impl Strategy<Value = FilterValue> {
    (any::<Option<i64>>(), any::<Option<i64>>())
        .prop_filter("range needs a bound", |(min, max)| min.is_some() || max.is_some())
        .prop_map(|(min, max)| FilterValue::Range(min, max))
}

fn arb_filters() -> impl Strategy<Value = FilterState> {
    (
        prop::option::of(arb_text()),
        prop::option::of(arb_text().prop_filter("ci sentinel", |v| v != "any")),
        prop::option::of(arb_multi()),
        prop::option::of(arb_text()),
        prop::option::of(arb_range()),
        prop::option::of(arb_text()),
    )
        .prop_map(|(user, ci, status, branch, duration, query)| {
            let mut state = FilterState::new();
            if let Some(v) = user {
                state.insert("user", FilterValue::Text(v));
            }
            if let Some(v) = ci {
                state.insert("ci", FilterValue::Text(v));
            }
            if let Some(v) = status {
                state.insert("status", v);
            }
            if let Some(v) = branch {
                state.insert("branch", FilterValue::Text(v));
            }
            if let Some(v) = duration {
                state.insert("duration", v);
            }
            if let Some(v) = query {
                state.insert("query", FilterValue::Text(v));
            }
            state
        })
}

fn arb_sort() -> impl Strategy<Value = SortState> {
    let column = prop::sample::select(vec!["created_at", "duration", "number", "status", "branch"]);
    prop_oneof![
        Just(SortState::unsorted()),
        (column, any::<bool>()).prop_map(|(column, desc)| SortState {
            column: Some(column.to_string()),
            direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
        }),
    ]
}

fn arb_query_state() -> impl Strategy<Value = QueryState> {
    (
        arb_filters(),
        arb_sort(),
        prop::option::of(arb_text()),
        prop::option::of(prop::sample::select(vec!["logs", "tests", "metrics"])),
    )
        .prop_map(|(filters, sort, build, tab)| {
            let mut state = QueryState::new(filters, sort);
            if let Some(build) = build {
                state = state.with_misc("build", build);
            }
            if let Some(tab) = tab {
                state = state.with_misc("tab", tab);
            }
            state
        })
}

/// Filter states built from the keys the tab presets look at.
fn arb_tab_filters() -> impl Strategy<Value = FilterState> {
    let user = prop::option::of(prop::sample::select(vec!["me", "alex", "sam"]));
    let ci = prop::option::of(prop::sample::select(vec!["true", "false"]));
    (user, ci, prop::option::of(arb_text())).prop_map(|(user, ci, branch)| {
        let mut state = FilterState::new();
        if let Some(user) = user {
            state.insert(USER_FILTER, FilterValue::text(user));
        }
        if let Some(ci) = ci {
            state.insert(CI_FILTER, FilterValue::text(ci));
        }
        if let Some(branch) = branch {
            state.insert("branch", FilterValue::Text(branch));
        }
        state
    })
}

fn arb_tab() -> impl Strategy<Value = TabId> {
    prop_oneof![
        Just(TabId::MineCi),
        Just(TabId::Mine),
        Just(TabId::Ci),
        Just(TabId::All),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ========================================================================
    // Codec
    // ========================================================================

    #[test]
    fn prop_decode_encode_round_trip(state in arb_query_state()) {
        let c = codec();
        prop_assert_eq!(c.decode(&c.encode(&state)), state);
    }

    #[test]
    fn prop_decode_is_total_and_canonical(query in ".{0,64}") {
        let c = codec();
        let decoded = c.decode(&query);
        prop_assert_eq!(c.decode(&c.encode(&decoded)), decoded);
    }

    #[test]
    fn prop_encode_never_contains_sentinel(state in arb_query_state()) {
        let c = codec();
        let mut with_sentinels = state.clone();
        with_sentinels.filters.insert("ci", FilterValue::text("any"));
        with_sentinels.filters.insert("branch", FilterValue::text(""));
        let encoded = c.encode(&with_sentinels);
        prop_assert!(!encoded.contains("ci=any"));
        prop_assert!(!encoded.split('&').any(|pair| pair == "branch="));
    }

    // ========================================================================
    // Tabs
    // ========================================================================

    #[test]
    fn prop_resolve_is_total_and_consistent(state in arb_tab_filters()) {
        let resolver = TabResolver::builds();
        let resolution = resolver.resolve_match(&state);
        if resolution.exact {
            prop_assert!(resolution.preset.matches(&state));
            let first = resolver.presets().iter().find(|p| p.matches(&state)).map(|p| p.id);
            prop_assert_eq!(first, Some(resolution.preset.id));
        } else {
            prop_assert_eq!(resolution.preset.id, TabId::All);
            prop_assert!(resolver.presets().iter().all(|p| !p.matches(&state)));
        }
    }

    #[test]
    fn prop_select_then_resolve_lands_on_tab(state in arb_tab_filters(), tab in arb_tab()) {
        let resolver = TabResolver::builds();
        let selected = resolver.select(&state, tab);
        prop_assert_eq!(resolver.resolve(&selected), tab);
        prop_assert_eq!(selected.get("branch"), state.get("branch"));
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    #[test]
    fn prop_toggle_other_column_is_ascending(current in arb_sort()) {
        let controller = SortController::new(["created_at", "duration", "number", "status", "branch", "y"]);
        prop_assume!(current.column.as_deref() != Some("y"));
        prop_assert_eq!(controller.toggle(&current, "y"), SortState::asc("y"));
    }

    #[test]
    fn prop_toggle_twice_is_identity(current in arb_sort()) {
        let controller = SortController::new(["created_at", "duration", "number", "status", "branch"]);
        if let Some(column) = current.column.clone() {
            let twice = controller.toggle(&controller.toggle(&current, &column), &column);
            prop_assert_eq!(twice, current);
        }
    }
}
