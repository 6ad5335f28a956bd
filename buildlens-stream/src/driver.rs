//! Async driver: runs engine commands as tokio tasks and feeds completions
//! back through one channel, so the engine is only ever touched from here.

use crate::engine::{EngineCommand, ListEngine};
use crate::sidecar::IndicatorTicket;
use crate::source::BuildSource;
use crate::stream::PageTicket;
use buildlens_core::{FetchError, IndicatorsSnapshot, ResultPage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A finished fetch, tagged with the ticket it was issued under.
#[derive(Debug)]
pub enum EngineEvent {
    Page(PageTicket, Result<ResultPage, FetchError>),
    Indicators(IndicatorTicket, Result<IndicatorsSnapshot, FetchError>),
}

pub struct EngineDriver<S: BuildSource + 'static> {
    source: Arc<S>,
    engine: ListEngine,
    tx: mpsc::UnboundedSender<EngineEvent>,
    rx: mpsc::UnboundedReceiver<EngineEvent>,
    page_tasks: HashMap<PageTicket, JoinHandle<()>>,
    indicator_tasks: HashMap<IndicatorTicket, JoinHandle<()>>,
}

impl<S: BuildSource + 'static> EngineDriver<S> {
    pub fn new(source: Arc<S>, engine: ListEngine) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            engine,
            tx,
            rx,
            page_tasks: HashMap::new(),
            indicator_tasks: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &ListEngine {
        &self.engine
    }

    /// Run an engine operation and dispatch whatever it asks for.
    ///
    /// ```ignore
    /// driver.update(|engine| engine.select_tab(TabId::Mine));
    /// ```
    pub fn update<F>(&mut self, op: F)
    where
        F: FnOnce(&mut ListEngine) -> Vec<EngineCommand>,
    {
        let commands = op(&mut self.engine);
        self.dispatch(commands);
    }

    /// Like [`update`](Self::update) for fallible operations such as
    /// applying the filter dialog.
    pub fn try_update<F, E>(&mut self, op: F) -> Result<(), E>
    where
        F: FnOnce(&mut ListEngine) -> Result<Vec<EngineCommand>, E>,
    {
        let commands = op(&mut self.engine)?;
        self.dispatch(commands);
        Ok(())
    }

    pub fn dispatch(&mut self, commands: Vec<EngineCommand>) {
        for command in commands {
            match command {
                EngineCommand::FetchPage {
                    ticket,
                    request,
                    delay,
                } => {
                    trace!(page = ticket.page, attempt = ticket.attempt, "Spawning page fetch");
                    let source = Arc::clone(&self.source);
                    let tx = self.tx.clone();
                    let key = ticket.clone();
                    let handle = tokio::spawn(async move {
                        if let Some(delay) = delay {
                            tokio::time::sleep(delay).await;
                        }
                        let result = source.list_builds(&request).await;
                        let _ = tx.send(EngineEvent::Page(ticket, result));
                    });
                    self.page_tasks.insert(key, handle);
                }
                EngineCommand::FetchIndicators {
                    ticket,
                    request,
                    delay,
                } => {
                    trace!(page = ticket.page, attempt = ticket.attempt, "Spawning indicators fetch");
                    let source = Arc::clone(&self.source);
                    let tx = self.tx.clone();
                    let key = ticket.clone();
                    let handle = tokio::spawn(async move {
                        if let Some(delay) = delay {
                            tokio::time::sleep(delay).await;
                        }
                        let result = source.indicators(&request).await;
                        let _ = tx.send(EngineEvent::Indicators(ticket, result));
                    });
                    self.indicator_tasks.insert(key, handle);
                }
                EngineCommand::AbandonPage(ticket) => {
                    if let Some(handle) = self.page_tasks.remove(&ticket) {
                        debug!(page = ticket.page, "Aborting superseded page fetch");
                        handle.abort();
                    }
                }
                EngineCommand::AbandonIndicators(ticket) => {
                    if let Some(handle) = self.indicator_tasks.remove(&ticket) {
                        debug!(page = ticket.page, "Aborting superseded indicators fetch");
                        handle.abort();
                    }
                }
            }
        }
    }

    /// Number of spawned fetches whose completion has not been handled.
    pub fn pending(&self) -> usize {
        self.page_tasks.len() + self.indicator_tasks.len()
    }

    /// Wait for the next completion and feed it to the engine.
    ///
    /// Returns `false` without waiting when nothing is outstanding.
    pub async fn pump(&mut self) -> bool {
        if self.pending() == 0 {
            return false;
        }
        match self.rx.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Pump until every outstanding fetch, including follow-ups such as
    /// indicators and background retries, has completed.
    pub async fn settle(&mut self) {
        while self.pump().await {}
    }

    pub fn handle(&mut self, event: EngineEvent) {
        let commands = match event {
            EngineEvent::Page(ticket, result) => {
                self.page_tasks.remove(&ticket);
                self.engine.on_page_result(&ticket, result)
            }
            EngineEvent::Indicators(ticket, result) => {
                self.indicator_tasks.remove(&ticket);
                self.engine.on_indicators_result(&ticket, result)
            }
        };
        self.dispatch(commands);
    }
}

impl<S: BuildSource + 'static> Drop for EngineDriver<S> {
    fn drop(&mut self) {
        for (_, handle) in self.page_tasks.drain() {
            handle.abort();
        }
        for (_, handle) in self.indicator_tasks.drain() {
            handle.abort();
        }
    }
}
