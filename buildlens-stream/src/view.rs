//! Read-only snapshot of everything a list screen renders.

use crate::sidecar::{IndicatorsSidecar, IndicatorsStatus};
use crate::stream::{LastPage, StreamStatus};
use buildlens_core::{BuildRecord, IndicatorsSnapshot};
use buildlens_query::{SortState, TabId};

/// One committed filter, as a removable chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChip {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorsView<'a> {
    /// No page loaded yet.
    Hidden,
    /// Fetching; the previous page's snapshot is shown meanwhile.
    Loading(Option<&'a IndicatorsSnapshot>),
    Ready(&'a IndicatorsSnapshot),
    /// The service answered with no stats, or failed non-transiently.
    NoData,
    /// The service was unavailable after background retries.
    Unavailable { show_retry: bool },
}

impl<'a> IndicatorsView<'a> {
    pub(crate) fn from_sidecar(sidecar: &'a IndicatorsSidecar) -> Self {
        match sidecar.status() {
            IndicatorsStatus::Idle => IndicatorsView::Hidden,
            IndicatorsStatus::Loading => IndicatorsView::Loading(sidecar.snapshot()),
            IndicatorsStatus::Ready => match sidecar.snapshot() {
                Some(snapshot) if !snapshot.is_empty() => IndicatorsView::Ready(snapshot),
                _ => IndicatorsView::NoData,
            },
            IndicatorsStatus::Unavailable {
                retry_offered: false,
            } => IndicatorsView::NoData,
            IndicatorsStatus::Unavailable {
                retry_offered: true,
            } => IndicatorsView::Unavailable {
                show_retry: sidecar.show_retry(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListView<'a> {
    pub records: &'a [BuildRecord],
    pub tab: TabId,
    pub tab_label: &'a str,
    /// `false` when no preset matched and the catch-all tab is shown.
    pub tab_exact: bool,
    pub chips: Vec<FilterChip>,
    pub sort: &'a SortState,
    pub status: &'a StreamStatus,
    pub last_page: Option<LastPage>,
    /// Set once the result set is known to be empty.
    pub empty_message: Option<&'a str>,
    pub error: Option<&'a str>,
    pub indicators: IndicatorsView<'a>,
    pub can_load_more: bool,
}

impl ListView<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
