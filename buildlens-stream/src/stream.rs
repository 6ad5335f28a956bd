//! Paginated, append-only result stream keyed by the query fingerprint.

use crate::command::Command;
use buildlens_core::{BuildRecord, FetchError, PageNumber, ResultPage, RetryPolicy};
use buildlens_query::Fingerprint;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Identity of one primary fetch. A completion is merged only if its ticket
/// is still the in-flight one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageTicket {
    pub fingerprint: Fingerprint,
    /// Bumped on every newly issued request, so a refresh of the same query
    /// still supersedes the previous page 1.
    pub epoch: u64,
    pub page: PageNumber,
    /// Background retry number for this request, 0 for the first try.
    pub attempt: u32,
}

impl PageTicket {
    fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}

pub type StreamCommand = Command<PageTicket>;

/// Where the stream stands relative to the end of the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPage {
    More,
    /// Every page the server has was loaded.
    AllLoaded,
    /// More pages exist but the fetch ceiling was hit.
    MaximumReached,
}

/// Pagination bookkeeping from the most recent merged page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    pub current_page: PageNumber,
    pub total_pages: PageNumber,
    pub max_pages: PageNumber,
}

impl PaginationCursor {
    /// `None` until a page has been merged.
    ///
    /// When the last existing page is also the ceiling, nothing was cut off,
    /// so `AllLoaded` wins over `MaximumReached`.
    pub fn last_page(&self) -> Option<LastPage> {
        if self.current_page == 0 {
            return None;
        }
        if self.total_pages == 0 || self.current_page >= self.total_pages {
            Some(LastPage::AllLoaded)
        } else if self.current_page >= self.max_pages {
            Some(LastPage::MaximumReached)
        } else {
            Some(LastPage::More)
        }
    }

    pub fn is_last_page(&self) -> bool {
        matches!(
            self.last_page(),
            Some(LastPage::AllLoaded | LastPage::MaximumReached)
        )
    }
}

/// Page-level failure shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub message: String,
    /// Page whose fetch failed; a manual retry re-issues exactly this page.
    pub page: PageNumber,
    pub transient: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Idle,
    Loading,
    Ready,
    LoadingMore,
    Exhausted,
    Error(StreamError),
}

/// Result of feeding a page completion into the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Superseded ticket; nothing changed.
    Stale,
    /// The page was appended.
    Merged(PageNumber),
    /// Transient failure; the same page is fetched again after a backoff.
    Retrying(StreamCommand),
    /// The stream moved to `Error`.
    Failed,
}

#[derive(Debug, Clone)]
pub struct IncrementalResultStream {
    retry: RetryPolicy,
    fingerprint: Option<Fingerprint>,
    epoch: u64,
    status: StreamStatus,
    cursor: PaginationCursor,
    records: Vec<BuildRecord>,
    merged_pages: Vec<PageNumber>,
    in_flight: Option<PageTicket>,
}

impl IncrementalResultStream {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            fingerprint: None,
            epoch: 0,
            status: StreamStatus::Idle,
            cursor: PaginationCursor::default(),
            records: Vec::new(),
            merged_pages: Vec::new(),
            in_flight: None,
        }
    }

    /// Restart for a (possibly new) fingerprint: drop merged pages, reset the
    /// cursor and fetch page 1. Any in-flight request becomes inert.
    pub fn start(&mut self, fingerprint: Fingerprint) -> Vec<StreamCommand> {
        info!(fingerprint = %fingerprint, "Starting build stream");
        let mut commands = self.abandon_in_flight();
        self.fingerprint = Some(fingerprint);
        self.clear_results();
        commands.extend(self.issue(1, StreamStatus::Loading));
        commands
    }

    /// Same query from page 1 again.
    pub fn refresh(&mut self) -> Vec<StreamCommand> {
        match self.fingerprint.clone() {
            Some(fingerprint) => self.start(fingerprint),
            None => Vec::new(),
        }
    }

    /// Fetch `current_page + 1`. Only valid from `Ready`; a no-op otherwise or
    /// at the last page.
    pub fn load_more(&mut self) -> Vec<StreamCommand> {
        if self.status != StreamStatus::Ready {
            debug!(status = ?self.status, "Ignoring load_more outside Ready");
            return Vec::new();
        }
        if self.cursor.is_last_page() {
            debug!(cursor = ?self.cursor, "Ignoring load_more at last page");
            return Vec::new();
        }
        self.issue(self.cursor.current_page + 1, StreamStatus::LoadingMore)
            .into_iter()
            .collect()
    }

    pub fn on_page_result(
        &mut self,
        ticket: &PageTicket,
        result: Result<ResultPage, FetchError>,
    ) -> PageOutcome {
        if self.in_flight.as_ref() != Some(ticket) {
            debug!(
                fingerprint = %ticket.fingerprint,
                page = ticket.page,
                epoch = ticket.epoch,
                "Discarding superseded page response"
            );
            return PageOutcome::Stale;
        }

        match result {
            Ok(response) => {
                self.in_flight = None;
                self.merge(ticket.page, response);
                PageOutcome::Merged(ticket.page)
            }
            Err(err) if err.is_transient() && self.retry.allows(ticket.attempt) => {
                let next = ticket.next_attempt();
                let delay = self.retry.delay_for(ticket.attempt);
                warn!(
                    page = ticket.page,
                    attempt = next.attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient page failure, retrying"
                );
                self.in_flight = Some(next.clone());
                PageOutcome::Retrying(Command::FetchAfter(next, delay))
            }
            Err(err) => {
                warn!(page = ticket.page, error = %err, "Page fetch failed");
                self.in_flight = None;
                self.status = StreamStatus::Error(StreamError {
                    message: err.to_string(),
                    page: ticket.page,
                    transient: err.is_transient(),
                });
                PageOutcome::Failed
            }
        }
    }

    /// Manual retry from `Error`: re-issue the failed page for the same
    /// fingerprint with a fresh attempt counter.
    pub fn retry(&mut self) -> Vec<StreamCommand> {
        let StreamStatus::Error(error) = &self.status else {
            return Vec::new();
        };
        let page = error.page;
        let status = if page <= 1 {
            StreamStatus::Loading
        } else {
            StreamStatus::LoadingMore
        };
        self.issue(page, status).into_iter().collect()
    }

    /// Hide the error. Merged pages stay; with none merged the stream goes
    /// back to `Idle` until refreshed.
    pub fn dismiss_error(&mut self) {
        if matches!(self.status, StreamStatus::Error(_)) {
            self.status = self.settled_status();
        }
    }

    /// Forget everything, including the fingerprint.
    pub fn reset(&mut self) -> Vec<StreamCommand> {
        let commands = self.abandon_in_flight();
        self.fingerprint = None;
        self.clear_results();
        self.status = StreamStatus::Idle;
        commands
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn error(&self) -> Option<&StreamError> {
        match &self.status {
            StreamStatus::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn records(&self) -> &[BuildRecord] {
        &self.records
    }

    /// Page numbers in the order they were appended.
    pub fn merged_pages(&self) -> &[PageNumber] {
        &self.merged_pages
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn in_flight(&self) -> Option<&PageTicket> {
        self.in_flight.as_ref()
    }

    pub fn is_last_page(&self) -> bool {
        self.cursor.is_last_page()
    }

    pub fn last_page(&self) -> Option<LastPage> {
        self.cursor.last_page()
    }

    fn merge(&mut self, page: PageNumber, response: ResultPage) {
        if response.page != page {
            warn!(
                requested = page,
                returned = response.page,
                "Server page number differs from request; keeping request order"
            );
        }
        let count = response.results.len();
        self.records.extend(response.results);
        self.merged_pages.push(page);
        self.cursor = PaginationCursor {
            current_page: page,
            total_pages: response.total_pages,
            max_pages: response.max_pages,
        };
        self.status = self.settled_status();
        debug!(
            page,
            count,
            total_pages = self.cursor.total_pages,
            max_pages = self.cursor.max_pages,
            "Merged page"
        );
    }

    fn settled_status(&self) -> StreamStatus {
        match self.cursor.last_page() {
            None => StreamStatus::Idle,
            Some(LastPage::More) => StreamStatus::Ready,
            Some(_) => StreamStatus::Exhausted,
        }
    }

    fn issue(&mut self, page: PageNumber, status: StreamStatus) -> Option<StreamCommand> {
        let fingerprint = self.fingerprint.clone()?;
        self.epoch += 1;
        let ticket = PageTicket {
            fingerprint,
            epoch: self.epoch,
            page,
            attempt: 0,
        };
        self.in_flight = Some(ticket.clone());
        self.status = status;
        Some(Command::Fetch(ticket))
    }

    fn abandon_in_flight(&mut self) -> Vec<StreamCommand> {
        self.in_flight.take().map(Command::Abandon).into_iter().collect()
    }

    fn clear_results(&mut self) {
        self.records.clear();
        self.merged_pages.clear();
        self.cursor = PaginationCursor::default();
    }
}
