//! The list engine: URL in, fetch commands and a view model out.
//!
//! Committed filter and sort state is never stored apart from the URL. Every
//! navigation writes the [`Location`] first, then decodes it again and
//! restarts the stream if the fingerprint moved.

use crate::command::Command;
use crate::sidecar::{IndicatorTicket, IndicatorsSidecar, SidecarCommand, SidecarOutcome};
use crate::source::PageRequest;
use crate::stream::{
    IncrementalResultStream, PageOutcome, PageTicket, StreamCommand, StreamStatus,
};
use crate::view::{FilterChip, IndicatorsView, ListView};
use buildlens_core::{
    FetchError, IndicatorsSnapshot, PageNumber, ResultPage, RetryPolicy, Scope,
};
use buildlens_query::{
    remove_filter, reset_filters, resolve_detail_tab, select_detail_tab, DetailTab,
    FilterDialogBuffer, FilterSchema, FilterValue, Fingerprint, Location, Navigation, QueryError,
    QueryState, QueryStateCodec, SortController, TabId, TabResolution, TabResolver, BUILD_PARAM,
    DETAIL_TAB_PARAM,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What the engine is built from.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub schema: Arc<FilterSchema>,
    pub tabs: TabResolver,
    pub stream_retry: RetryPolicy,
    pub indicators_retry: RetryPolicy,
}

impl EngineConfig {
    /// The build list: its schema, its tabs, one retry policy for both fetches.
    pub fn builds(retry: RetryPolicy) -> Self {
        Self {
            schema: Arc::new(FilterSchema::builds()),
            tabs: TabResolver::builds(),
            stream_retry: retry.clone(),
            indicators_retry: retry,
        }
    }
}

/// I/O the driver performs on the engine's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    FetchPage {
        ticket: PageTicket,
        request: PageRequest,
        delay: Option<Duration>,
    },
    FetchIndicators {
        ticket: IndicatorTicket,
        request: PageRequest,
        delay: Option<Duration>,
    },
    AbandonPage(PageTicket),
    AbandonIndicators(IndicatorTicket),
}

#[derive(Debug, Clone)]
pub struct ListEngine {
    codec: QueryStateCodec,
    sorter: SortController,
    tabs: TabResolver,
    scope: Scope,
    location: Location,
    state: QueryState,
    fingerprint: Fingerprint,
    dialog: FilterDialogBuffer,
    stream: IncrementalResultStream,
    sidecar: IndicatorsSidecar,
}

impl ListEngine {
    pub fn new(config: EngineConfig, scope: Scope, initial_query: &str) -> Self {
        let codec = QueryStateCodec::new(Arc::clone(&config.schema));
        let sorter = SortController::new(config.schema.sortable_columns().iter().cloned());
        let location = Location::new(initial_query);
        let state = codec.decode(location.current());
        let fingerprint = Fingerprint::new(&codec, &scope, &state.filters, &state.sort);
        Self {
            dialog: FilterDialogBuffer::new(config.schema),
            codec,
            sorter,
            tabs: config.tabs,
            scope,
            location,
            state,
            fingerprint,
            stream: IncrementalResultStream::new(config.stream_retry),
            sidecar: IndicatorsSidecar::new(config.indicators_retry),
        }
    }

    /// Start loading the list for the current URL.
    pub fn mount(&mut self) -> Vec<EngineCommand> {
        let mut commands = self.restart();
        commands.extend(self.ensure_detail_tab());
        commands
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Apply a navigation from any source, including external URL edits.
    pub fn navigate(&mut self, nav: Navigation) -> Vec<EngineCommand> {
        debug!(navigation = ?nav, "Navigating");
        if !self.location.navigate(nav) {
            return Vec::new();
        }
        self.sync_from_location()
    }

    pub fn navigate_back(&mut self) -> Vec<EngineCommand> {
        if !self.location.back() {
            return Vec::new();
        }
        self.sync_from_location()
    }

    pub fn navigate_forward(&mut self) -> Vec<EngineCommand> {
        if !self.location.forward() {
            return Vec::new();
        }
        self.sync_from_location()
    }

    /// Move to another repository. Filters, sort, history and the cursor are
    /// all dropped.
    pub fn set_scope(&mut self, scope: Scope) -> Vec<EngineCommand> {
        info!(scope = %scope, "Switching scope");
        let abandoned = self.stream.reset();
        let mut commands = self.page_commands(abandoned);
        let abandoned = self.sidecar.reset();
        commands.extend(self.sidecar_commands(abandoned));
        self.dialog.cancel();
        self.scope = scope;
        self.location = Location::default();
        self.state = self.codec.decode(self.location.current());
        self.fingerprint = self.compute_fingerprint();
        commands.extend(self.restart());
        commands
    }

    // ------------------------------------------------------------------
    // Filters, tabs, sorting
    // ------------------------------------------------------------------

    pub fn open_filters(&mut self) {
        self.dialog.open(&self.state.filters);
    }

    pub fn set_draft_value(&mut self, key: &str, value: FilterValue) -> Result<(), QueryError> {
        self.dialog.set_draft_value(key, value)
    }

    pub fn clear_draft(&mut self) -> Result<(), QueryError> {
        self.dialog.clear_all()
    }

    pub fn cancel_filters(&mut self) {
        self.dialog.cancel();
    }

    /// Commit the dialog draft with push semantics.
    pub fn apply_filters(&mut self) -> Result<Vec<EngineCommand>, QueryError> {
        let nav = self.dialog.apply(&self.codec, &self.state)?;
        Ok(self.navigate(nav))
    }

    pub fn reset_filters(&mut self) -> Vec<EngineCommand> {
        let nav = reset_filters(&self.codec, &self.state);
        self.navigate(nav)
    }

    pub fn remove_filter(&mut self, key: &str) -> Vec<EngineCommand> {
        let nav = remove_filter(&self.codec, &self.state, key);
        self.navigate(nav)
    }

    /// Tab clicks rewrite the current history entry.
    pub fn select_tab(&mut self, id: TabId) -> Vec<EngineCommand> {
        let next = QueryState {
            filters: self.tabs.select(&self.state.filters, id),
            ..self.state.clone()
        };
        let nav = Navigation::Replace(self.codec.encode(&next));
        self.navigate(nav)
    }

    /// Column-header click.
    pub fn sort_by(&mut self, column: &str) -> Vec<EngineCommand> {
        if !self.sorter.is_sortable(column) {
            debug!(column, "Ignoring sort on non-sortable column");
            return Vec::new();
        }
        let next = QueryState {
            sort: self.sorter.toggle(&self.state.sort, column),
            ..self.state.clone()
        };
        let nav = Navigation::Push(self.codec.encode(&next));
        self.navigate(nav)
    }

    // ------------------------------------------------------------------
    // Build detail panel
    // ------------------------------------------------------------------

    pub fn open_build(&mut self, build_id: &str) -> Vec<EngineCommand> {
        let next = self.state.clone().with_misc(BUILD_PARAM, build_id);
        let nav = Navigation::Push(self.codec.encode(&next));
        self.navigate(nav)
    }

    pub fn close_build(&mut self) -> Vec<EngineCommand> {
        let mut next = self.state.clone();
        next.misc.remove(BUILD_PARAM);
        next.misc.remove(DETAIL_TAB_PARAM);
        let nav = Navigation::Push(self.codec.encode(&next));
        self.navigate(nav)
    }

    /// Redirect (replace) to the default sub-tab when the open build's
    /// `tab` parameter is missing or unknown. Runs after every URL change.
    pub fn ensure_detail_tab(&mut self) -> Vec<EngineCommand> {
        if self.open_build_id().is_none() {
            return Vec::new();
        }
        match resolve_detail_tab(&self.codec, &self.state) {
            (_, Some(nav)) => self.navigate(nav),
            (_, None) => Vec::new(),
        }
    }

    pub fn select_detail_tab(&mut self, tab: DetailTab) -> Vec<EngineCommand> {
        let nav = select_detail_tab(&self.codec, &self.state, tab);
        self.navigate(nav)
    }

    pub fn open_build_id(&self) -> Option<&str> {
        self.state.misc.get(BUILD_PARAM).map(String::as_str)
    }

    pub fn detail_tab(&self) -> DetailTab {
        resolve_detail_tab(&self.codec, &self.state).0
    }

    // ------------------------------------------------------------------
    // Stream control
    // ------------------------------------------------------------------

    pub fn load_more(&mut self) -> Vec<EngineCommand> {
        let commands = self.stream.load_more();
        self.page_commands(commands)
    }

    /// Page 1 again for the same query.
    pub fn refresh(&mut self) -> Vec<EngineCommand> {
        self.restart()
    }

    pub fn retry(&mut self) -> Vec<EngineCommand> {
        let commands = self.stream.retry();
        self.page_commands(commands)
    }

    pub fn dismiss_error(&mut self) {
        self.stream.dismiss_error();
    }

    pub fn retry_indicators(&mut self) -> Vec<EngineCommand> {
        let commands = self.sidecar.retry();
        self.sidecar_commands(commands)
    }

    pub fn dismiss_indicators(&mut self) {
        self.sidecar.dismiss();
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    pub fn on_page_result(
        &mut self,
        ticket: &PageTicket,
        result: Result<ResultPage, FetchError>,
    ) -> Vec<EngineCommand> {
        match self.stream.on_page_result(ticket, result) {
            PageOutcome::Merged(page) => {
                let commands = self.sidecar.start(ticket.fingerprint.clone(), page);
                self.sidecar_commands(commands)
            }
            PageOutcome::Retrying(command) => self.page_commands(vec![command]),
            PageOutcome::Stale | PageOutcome::Failed => Vec::new(),
        }
    }

    pub fn on_indicators_result(
        &mut self,
        ticket: &IndicatorTicket,
        result: Result<IndicatorsSnapshot, FetchError>,
    ) -> Vec<EngineCommand> {
        match self.sidecar.on_result(ticket, result) {
            SidecarOutcome::Retrying(command) => self.sidecar_commands(vec![command]),
            _ => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn current_query(&self) -> &str {
        self.location.current()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn query_state(&self) -> &QueryState {
        &self.state
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn codec(&self) -> &QueryStateCodec {
        &self.codec
    }

    pub fn dialog(&self) -> &FilterDialogBuffer {
        &self.dialog
    }

    /// Whether the open filter dialog differs from the URL's filters.
    pub fn filters_dirty(&self) -> bool {
        self.dialog.is_dirty(&self.state.filters)
    }

    pub fn stream(&self) -> &IncrementalResultStream {
        &self.stream
    }

    pub fn sidecar(&self) -> &IndicatorsSidecar {
        &self.sidecar
    }

    pub fn active_tab(&self) -> TabResolution<'_> {
        self.tabs.resolve_match(&self.state.filters)
    }

    /// Committed filters in schema order, for chip rendering.
    pub fn active_chips(&self) -> Vec<FilterChip> {
        self.codec
            .schema()
            .filters()
            .iter()
            .filter_map(|def| {
                let value = self.state.filters.get(&def.key)?;
                Some(FilterChip {
                    key: def.key.clone(),
                    label: def.label.clone(),
                    value: value.display(),
                })
            })
            .collect()
    }

    pub fn view(&self) -> ListView<'_> {
        let tab = self.active_tab();
        let status = self.stream.status();
        let settled = matches!(status, StreamStatus::Exhausted);
        ListView {
            records: self.stream.records(),
            tab: tab.preset.id,
            tab_label: &tab.preset.label,
            tab_exact: tab.exact,
            chips: self.active_chips(),
            sort: &self.state.sort,
            status,
            last_page: self.stream.last_page(),
            empty_message: (settled && self.stream.records().is_empty())
                .then_some(tab.preset.empty_message.as_str()),
            error: self.stream.error().map(|e| e.message.as_str()),
            indicators: IndicatorsView::from_sidecar(&self.sidecar),
            can_load_more: *status == StreamStatus::Ready && !self.stream.is_last_page(),
        }
    }

    /// Request for `page` of the current query.
    pub fn page_request(&self, page: PageNumber) -> PageRequest {
        PageRequest::new(
            self.scope.clone(),
            self.codec
                .request_params(&self.state.filters, &self.state.sort),
            page,
        )
    }

    fn sync_from_location(&mut self) -> Vec<EngineCommand> {
        let next = self.codec.decode(self.location.current());
        if next.filters != self.state.filters {
            self.dialog.rebase(&next.filters);
        }
        self.state = next;

        let fingerprint = self.compute_fingerprint();
        let mut commands = if self.stream.fingerprint() == Some(&fingerprint) {
            debug!("View state changed; keeping merged pages");
            self.fingerprint = fingerprint;
            Vec::new()
        } else {
            info!(
                from = %self.fingerprint,
                to = %fingerprint,
                "Query changed; restarting list"
            );
            self.fingerprint = fingerprint;
            self.restart()
        };
        commands.extend(self.ensure_detail_tab());
        commands
    }

    fn restart(&mut self) -> Vec<EngineCommand> {
        let abandoned = self.sidecar.reset();
        let mut commands = self.sidecar_commands(abandoned);
        let started = self.stream.start(self.fingerprint.clone());
        commands.extend(self.page_commands(started));
        commands
    }

    fn compute_fingerprint(&self) -> Fingerprint {
        Fingerprint::new(
            &self.codec,
            &self.scope,
            &self.state.filters,
            &self.state.sort,
        )
    }

    fn page_commands(&self, commands: Vec<StreamCommand>) -> Vec<EngineCommand> {
        commands
            .into_iter()
            .map(|command| match command {
                Command::Fetch(ticket) => EngineCommand::FetchPage {
                    request: self.page_request(ticket.page),
                    ticket,
                    delay: None,
                },
                Command::FetchAfter(ticket, delay) => EngineCommand::FetchPage {
                    request: self.page_request(ticket.page),
                    ticket,
                    delay: Some(delay),
                },
                Command::Abandon(ticket) => EngineCommand::AbandonPage(ticket),
            })
            .collect()
    }

    fn sidecar_commands(&self, commands: Vec<SidecarCommand>) -> Vec<EngineCommand> {
        commands
            .into_iter()
            .map(|command| match command {
                Command::Fetch(ticket) => EngineCommand::FetchIndicators {
                    request: self.page_request(ticket.page),
                    ticket,
                    delay: None,
                },
                Command::FetchAfter(ticket, delay) => EngineCommand::FetchIndicators {
                    request: self.page_request(ticket.page),
                    ticket,
                    delay: Some(delay),
                },
                Command::Abandon(ticket) => EngineCommand::AbandonIndicators(ticket),
            })
            .collect()
    }
}
