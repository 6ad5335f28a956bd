//! Per-page aggregate stats fetched alongside the primary stream.
//!
//! Failures here never surface as a page-level error. Transient failures are
//! retried quietly and then offered as a dismissible manual retry; anything
//! else degrades to "no indicators".

use crate::command::Command;
use buildlens_core::{FetchError, IndicatorsSnapshot, PageNumber, RetryPolicy};
use buildlens_query::Fingerprint;
use tracing::{debug, warn};

/// Identity of one indicators fetch. Staleness is judged by fingerprint and
/// page number, not by issue order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorTicket {
    pub fingerprint: Fingerprint,
    pub page: PageNumber,
    pub attempt: u32,
}

pub type SidecarCommand = Command<IndicatorTicket>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorsStatus {
    Idle,
    Loading,
    Ready,
    /// `retry_offered` is set only for transient failures that exhausted
    /// their background retries.
    Unavailable { retry_offered: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarOutcome {
    Stale,
    Updated,
    Retrying(SidecarCommand),
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct IndicatorsSidecar {
    retry: RetryPolicy,
    fingerprint: Option<Fingerprint>,
    page: PageNumber,
    status: IndicatorsStatus,
    snapshot: Option<IndicatorsSnapshot>,
    in_flight: Option<IndicatorTicket>,
    dismissed: bool,
}

impl IndicatorsSidecar {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            retry,
            fingerprint: None,
            page: 0,
            status: IndicatorsStatus::Idle,
            snapshot: None,
            in_flight: None,
            dismissed: false,
        }
    }

    /// Fetch indicators for a page that just loaded.
    ///
    /// The previous snapshot stays visible until the new one lands, unless
    /// the fingerprint changed, in which case it no longer describes the list.
    pub fn start(&mut self, fingerprint: Fingerprint, page: PageNumber) -> Vec<SidecarCommand> {
        let mut commands = self.abandon_in_flight();
        if self.fingerprint.as_ref() != Some(&fingerprint) {
            self.snapshot = None;
        }
        self.fingerprint = Some(fingerprint);
        self.page = page;
        self.dismissed = false;
        commands.extend(self.issue());
        commands
    }

    pub fn on_result(
        &mut self,
        ticket: &IndicatorTicket,
        result: Result<IndicatorsSnapshot, FetchError>,
    ) -> SidecarOutcome {
        let current = self.in_flight.is_some()
            && self.fingerprint.as_ref() == Some(&ticket.fingerprint)
            && self.page == ticket.page;
        if !current {
            debug!(page = ticket.page, current_page = self.page, "Discarding stale indicators");
            return SidecarOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(snapshot) => {
                debug!(page = ticket.page, entries = snapshot.len(), "Indicators updated");
                self.snapshot = Some(snapshot);
                self.status = IndicatorsStatus::Ready;
                SidecarOutcome::Updated
            }
            Err(err) if err.is_transient() && self.retry.allows(ticket.attempt) => {
                let next = IndicatorTicket {
                    attempt: ticket.attempt + 1,
                    ..ticket.clone()
                };
                let delay = self.retry.delay_for(ticket.attempt);
                debug!(
                    page = ticket.page,
                    attempt = next.attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient indicators failure, retrying"
                );
                self.in_flight = Some(next.clone());
                SidecarOutcome::Retrying(Command::FetchAfter(next, delay))
            }
            Err(err) => {
                let retry_offered = err.is_transient();
                if retry_offered {
                    warn!(page = ticket.page, error = %err, "Indicators service unavailable");
                } else {
                    debug!(page = ticket.page, error = %err, "No indicators for page");
                }
                self.snapshot = None;
                self.status = IndicatorsStatus::Unavailable { retry_offered };
                SidecarOutcome::Unavailable
            }
        }
    }

    /// Manual retry: re-issues only the indicators fetch for the current page.
    pub fn retry(&mut self) -> Vec<SidecarCommand> {
        if self.status != (IndicatorsStatus::Unavailable { retry_offered: true }) {
            return Vec::new();
        }
        self.dismissed = false;
        self.issue().into_iter().collect()
    }

    /// Hide the retry affordance.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn reset(&mut self) -> Vec<SidecarCommand> {
        let commands = self.abandon_in_flight();
        self.fingerprint = None;
        self.page = 0;
        self.status = IndicatorsStatus::Idle;
        self.snapshot = None;
        self.dismissed = false;
        commands
    }

    pub fn status(&self) -> IndicatorsStatus {
        self.status
    }

    pub fn snapshot(&self) -> Option<&IndicatorsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn page(&self) -> PageNumber {
        self.page
    }

    pub fn show_retry(&self) -> bool {
        !self.dismissed && self.status == (IndicatorsStatus::Unavailable { retry_offered: true })
    }

    fn issue(&mut self) -> Option<SidecarCommand> {
        let fingerprint = self.fingerprint.clone()?;
        let ticket = IndicatorTicket {
            fingerprint,
            page: self.page,
            attempt: 0,
        };
        self.in_flight = Some(ticket.clone());
        self.status = IndicatorsStatus::Loading;
        Some(Command::Fetch(ticket))
    }

    fn abandon_in_flight(&mut self) -> Vec<SidecarCommand> {
        self.in_flight.take().map(Command::Abandon).into_iter().collect()
    }
}
