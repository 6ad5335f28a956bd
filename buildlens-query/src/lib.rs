//! BuildLens Query - URL-synchronized list state
//!
//! Everything that maps between the shareable query string and typed list
//! state: the filter schema, the codec, sort tokens, preset tabs, the filter
//! dialog's draft buffer, the query fingerprint and the history stack.

pub mod codec;
pub mod detail;
pub mod dialog;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod location;
pub mod sort;
pub mod tabs;

pub use codec::{QueryState, QueryStateCodec, SORT_PARAM};
pub use detail::{resolve_detail_tab, select_detail_tab, DetailTab};
pub use dialog::{remove_filter, reset_filters, FilterDialogBuffer};
pub use error::QueryError;
pub use filter::{
    FilterDef, FilterKind, FilterSchema, FilterState, FilterValue, BUILD_PARAM, CI_FILTER,
    CURRENT_USER, DETAIL_TAB_PARAM, USER_FILTER,
};
pub use fingerprint::Fingerprint;
pub use location::{Location, Navigation};
pub use sort::{decode_token, encode_token, SortController, SortDirection, SortState};
pub use tabs::{TabId, TabPreset, TabResolution, TabResolver};
