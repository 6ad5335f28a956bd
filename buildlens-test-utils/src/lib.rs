//! BuildLens Test Utilities
//!
//! Shared test infrastructure for the BuildLens workspace:
//! - A scripted mock `BuildSource` with latency gates and failure injection
//! - Proptest generators for build data and fetch errors
//! - Fixtures for common scenarios
//! - Assertions over engine state

pub use buildlens_core::{
    BuildRecord, BuildStatus, FetchError, IndicatorsSnapshot, PageNumber, ResultPage,
    RetryPolicy, Scope,
};
pub use buildlens_stream::{BuildSource, EngineCommand, ListEngine, PageRequest};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

// ============================================================================
// MOCK SOURCE
// ============================================================================

/// Which of the two reads a script entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    List,
    Indicators,
}

/// Holds back one call until released.
#[derive(Debug, Clone)]
pub struct Gate(Arc<Notify>);

impl Gate {
    /// Let the held call proceed. Releasing before the call arrives is fine;
    /// the permit is stored.
    pub fn release(&self) {
        self.0.notify_one();
    }
}

#[derive(Debug, Default)]
struct MockState {
    failures: HashMap<(Endpoint, PageNumber), VecDeque<FetchError>>,
    gates: HashMap<(Endpoint, PageNumber), Arc<Notify>>,
    calls: Vec<(Endpoint, PageRequest)>,
}

/// In-memory build source serving a fixed number of pages.
///
/// Records reflect the request: the `branch` parameter (default `main`)
/// appears in every id, so tests can tell which query a page came from.
#[derive(Debug)]
pub struct MockBuildSource {
    total_pages: PageNumber,
    max_pages: PageNumber,
    per_page: usize,
    empty_indicators: bool,
    state: Mutex<MockState>,
}

impl MockBuildSource {
    pub fn paged(total_pages: PageNumber, max_pages: PageNumber) -> Self {
        Self {
            total_pages,
            max_pages,
            per_page: 2,
            empty_indicators: false,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Indicators calls succeed with an empty snapshot.
    pub fn with_empty_indicators(mut self) -> Self {
        self.empty_indicators = true;
        self
    }

    /// The next `times` calls to `endpoint` for `page` fail with `error`.
    pub fn fail_times(&self, endpoint: Endpoint, page: PageNumber, error: FetchError, times: usize) {
        let mut state = self.lock();
        let queue = state.failures.entry((endpoint, page)).or_default();
        queue.extend(std::iter::repeat(error).take(times));
    }

    pub fn fail_next(&self, endpoint: Endpoint, page: PageNumber, error: FetchError) {
        self.fail_times(endpoint, page, error, 1);
    }

    /// Hold the next call to `endpoint` for `page` until the gate is released.
    pub fn hold(&self, endpoint: Endpoint, page: PageNumber) -> Gate {
        let notify = Arc::new(Notify::new());
        self.lock()
            .gates
            .insert((endpoint, page), Arc::clone(&notify));
        Gate(notify)
    }

    pub fn calls(&self, endpoint: Endpoint) -> Vec<PageRequest> {
        self.lock()
            .calls
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.lock().calls.iter().filter(|(e, _)| *e == endpoint).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn script(&self, endpoint: Endpoint, request: &PageRequest) -> Result<(), FetchError> {
        let gate = {
            let mut state = self.lock();
            state.calls.push((endpoint, request.clone()));
            state.gates.remove(&(endpoint, request.page))
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failure = self
            .lock()
            .failures
            .get_mut(&(endpoint, request.page))
            .and_then(VecDeque::pop_front);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn page_for(&self, request: &PageRequest) -> ResultPage {
        let branch = request.param("branch").unwrap_or("main");
        let results = if request.page == 0 || request.page > self.total_pages {
            Vec::new()
        } else {
            (0..self.per_page)
                .map(|i| {
                    let number = (request.page as usize - 1) * self.per_page + i + 1;
                    let mut record = fixtures::sample_build(
                        &format!("{branch}-{}-{i}", request.page),
                        number as u64,
                    );
                    record.branch = branch.to_string();
                    record
                })
                .collect()
        };
        ResultPage {
            results,
            total_pages: self.total_pages,
            max_pages: self.max_pages,
            page: request.page,
        }
    }
}

#[async_trait]
impl BuildSource for MockBuildSource {
    async fn list_builds(&self, request: &PageRequest) -> Result<ResultPage, FetchError> {
        self.script(Endpoint::List, request).await?;
        Ok(self.page_for(request))
    }

    async fn indicators(&self, request: &PageRequest) -> Result<IndicatorsSnapshot, FetchError> {
        self.script(Endpoint::Indicators, request).await?;
        if self.empty_indicators {
            return Ok(IndicatorsSnapshot::new());
        }
        Ok(IndicatorsSnapshot::new()
            .with("page", serde_json::json!(request.page))
            .with("builds", serde_json::json!(self.per_page))
            .with("failure_rate", serde_json::json!(0.25)))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for BuildLens types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_build_status() -> impl Strategy<Value = BuildStatus> {
        prop_oneof![
            Just(BuildStatus::Success),
            Just(BuildStatus::Failure),
            Just(BuildStatus::Cancelled),
            Just(BuildStatus::Running),
            Just(BuildStatus::Queued),
        ]
    }

    pub fn arb_build_record() -> impl Strategy<Value = BuildRecord> {
        (
            "[a-z0-9]{8}",
            1u64..100_000,
            arb_build_status(),
            "[a-z][a-z0-9/_-]{0,20}",
            "[0-9a-f]{40}",
            "[a-z]{3,10}",
            any::<bool>(),
            0i64..1_000_000,
            prop::option::of(0u64..86_400),
        )
            .prop_map(
                |(id, number, status, branch, commit_sha, author, is_ci, offset, duration_secs)| {
                    BuildRecord {
                        id,
                        number,
                        status,
                        branch,
                        commit_sha,
                        author,
                        is_ci,
                        created_at: fixtures::epoch() + ChronoDuration::seconds(offset),
                        duration_secs,
                    }
                },
            )
    }

    /// A page consistent with its own cursor fields.
    pub fn arb_result_page() -> impl Strategy<Value = ResultPage> {
        (1u32..20, 1u32..20)
            .prop_flat_map(|(total, max)| (Just(total), Just(max), 1..=total.min(max)))
            .prop_flat_map(|(total, max, page)| {
                prop::collection::vec(arb_build_record(), 0..5).prop_map(move |results| {
                    ResultPage {
                        results,
                        total_pages: total,
                        max_pages: max,
                        page,
                    }
                })
            })
    }

    pub fn arb_fetch_error() -> impl Strategy<Value = FetchError> {
        prop_oneof![
            (400u16..600, "[a-z ]{0,20}").prop_map(|(status, message)| FetchError::Http {
                status,
                message
            }),
            "[a-z ]{0,20}".prop_map(|message| FetchError::Timeout { message }),
            "[a-z ]{0,20}".prop_map(|message| FetchError::Connect { message }),
            "[a-z ]{0,20}".prop_map(|reason| FetchError::Decode { reason }),
        ]
    }

    pub fn arb_retry_policy() -> impl Strategy<Value = RetryPolicy> {
        (0u32..6, 1u64..500, 0u64..50, 1.0f64..4.0, 0u64..100).prop_map(
            |(max_retries, initial_ms, extra, multiplier, jitter_ms)| RetryPolicy {
                max_retries,
                initial_ms,
                max_ms: initial_ms + extra * 100,
                multiplier,
                jitter_ms,
            },
        )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made values for tests.

    use super::*;
    use buildlens_stream::EngineConfig;

    /// Fixed timestamp so fixtures compare equal across runs.
    pub fn epoch() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn scope() -> Scope {
        Scope::new("acme", "rocket")
    }

    pub fn sample_build(id: &str, number: u64) -> BuildRecord {
        BuildRecord {
            id: id.to_string(),
            number,
            status: BuildStatus::Success,
            branch: "main".to_string(),
            commit_sha: format!("{number:040x}"),
            author: "sam".to_string(),
            is_ci: true,
            created_at: epoch() + ChronoDuration::minutes(number as i64),
            duration_secs: Some(60 + number),
        }
    }

    /// Page `page` holding `count` builds.
    pub fn result_page(
        page: PageNumber,
        total_pages: PageNumber,
        max_pages: PageNumber,
        count: usize,
    ) -> ResultPage {
        ResultPage {
            results: (0..count)
                .map(|i| sample_build(&format!("p{page}-{i}"), (page as u64) * 100 + i as u64))
                .collect(),
            total_pages,
            max_pages,
            page,
        }
    }

    /// Millisecond-scale retries so async tests stay fast.
    pub fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_ms: 1,
            max_ms: 5,
            multiplier: 2.0,
            jitter_ms: 0,
        }
    }

    pub fn engine(query: &str) -> ListEngine {
        ListEngine::new(EngineConfig::builds(fast_retry()), scope(), query)
    }

    pub fn engine_without_retries(query: &str) -> ListEngine {
        ListEngine::new(EngineConfig::builds(RetryPolicy::disabled()), scope(), query)
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over engine state and emitted commands.

    use super::*;

    /// Pages were appended exactly in this order.
    pub fn assert_pages_merged(engine: &ListEngine, expected: &[PageNumber]) {
        assert_eq!(
            engine.stream().merged_pages(),
            expected,
            "merged pages differ"
        );
    }

    pub fn assert_no_page_fetch(commands: &[EngineCommand]) {
        assert!(
            !commands
                .iter()
                .any(|c| matches!(c, EngineCommand::FetchPage { .. })),
            "expected no page fetch, got {commands:?}"
        );
    }

    /// Every merged record came from a query with this `branch` filter.
    pub fn assert_all_from_branch(engine: &ListEngine, branch: &str) {
        for record in engine.stream().records() {
            assert_eq!(record.branch, branch, "record {} from another query", record.id);
        }
    }
}
