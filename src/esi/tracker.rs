//! Shared ESI error budget tracking.
//!
//! ESI allows a limited number of error responses per window and answers with HTTP 420 for
//! every request once the budget is spent. [`EsiTracker`] holds the remaining budget and reset
//! countdown reported by the `X-Esi-Error-Limit-*` headers and offers two checks for callers
//! about to hit ESI:
//!
//! - [`EsiTracker::watchman`] answers whether a request may proceed right now
//! - [`EsiTracker::gate_keeper`] blocks until the budget recovers
//!
//! One tracker is created at startup and cloned into every component that talks to ESI.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use tokio::time::Instant;

pub const ERROR_LIMIT_REMAIN_HEADER: &str = "x-esi-error-limit-remain";
pub const ERROR_LIMIT_RESET_HEADER: &str = "x-esi-error-limit-reset";

/// Budget below which requests are withheld
const RED_THRESHOLD: i64 = 10;
/// Budget at or below which requests are slowed down
const YELLOW_THRESHOLD: i64 = 20;
/// Budget ESI grants at the start of each window
const FULL_BUDGET: i64 = 100;
/// Window assumed when ESI answers 420 without a reset header
const DEFAULT_RESET_SECS: u64 = 60;

const BLOCKED_POLL_INTERVAL: Duration = Duration::from_secs(1);
const YELLOW_DELAY: Duration = Duration::from_millis(250);

/// How long call outcomes are kept for observability
const OUTCOME_WINDOW_SECS: i64 = 300;
const OUTCOME_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Green,
    Yellow,
    Red,
}

/// Classification of a finished ESI call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallOutcome {
    Ok,
    NotModified,
    ErrorLimited,
    ClientError,
    ServerError,
    Transport,
}

impl CallOutcome {
    pub fn from_status(code: u16) -> Self {
        match code {
            200..=299 => CallOutcome::Ok,
            304 => CallOutcome::NotModified,
            420 => CallOutcome::ErrorLimited,
            500..=599 => CallOutcome::ServerError,
            _ => CallOutcome::ClientError,
        }
    }
}

/// Count of each outcome within the tracking window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub ok: usize,
    pub not_modified: usize,
    pub error_limited: usize,
    pub client_error: usize,
    pub server_error: usize,
    pub transport: usize,
}

struct TrackerState {
    remain: i64,
    reset_at: Instant,
    outcomes: VecDeque<(DateTime<Utc>, CallOutcome)>,
}

#[derive(Clone)]
pub struct EsiTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl Default for EsiTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl EsiTracker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                remain: FULL_BUDGET,
                reset_at: Instant::now(),
                outcomes: VecDeque::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // A poisoned lock only means another thread panicked mid-update, counters stay usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Overwrites the budget counters, `reset_secs` is relative to now
    pub fn update_budget(&self, remain: i64, reset_secs: u64) {
        let mut state = self.lock();
        state.remain = remain;
        state.reset_at = Instant::now() + Duration::from_secs(reset_secs);
    }

    /// Records a response, updating the budget from its headers when present
    pub fn record_response(&self, code: u16, headers: &HeaderMap) {
        let remain = header_i64(headers, ERROR_LIMIT_REMAIN_HEADER);
        let reset = header_i64(headers, ERROR_LIMIT_RESET_HEADER).map(|secs| secs.max(0) as u64);

        let mut state = self.lock();
        if let Some(remain) = remain {
            state.remain = remain;
        }
        if let Some(reset) = reset {
            state.reset_at = Instant::now() + Duration::from_secs(reset);
        }
        if code == 420 {
            state.remain = 0;
            if reset.is_none() {
                state.reset_at = Instant::now() + Duration::from_secs(DEFAULT_RESET_SECS);
            }
        }

        push_outcome(&mut state, CallOutcome::from_status(code));
    }

    /// Records a call that failed before a response was received
    pub fn record_transport_failure(&self) {
        let mut state = self.lock();
        push_outcome(&mut state, CallOutcome::Transport);
    }

    pub fn status(&self) -> BudgetStatus {
        let state = self.lock();

        if Instant::now() >= state.reset_at {
            return BudgetStatus::Green;
        }

        if state.remain < RED_THRESHOLD {
            BudgetStatus::Red
        } else if state.remain <= YELLOW_THRESHOLD {
            BudgetStatus::Yellow
        } else {
            BudgetStatus::Green
        }
    }

    /// Remaining error budget as last reported by ESI
    pub fn remain(&self) -> i64 {
        self.lock().remain
    }

    /// Returns false when the error budget is too low to risk another request.
    pub fn watchman(&self) -> bool {
        self.status() != BudgetStatus::Red
    }

    /// Waits until the error budget allows another request.
    ///
    /// Polls every second while the budget is exhausted and adds a short delay while it is
    /// running low.
    pub async fn gate_keeper(&self) {
        let mut blocked = false;

        loop {
            match self.status() {
                BudgetStatus::Green => return,
                BudgetStatus::Yellow => {
                    tokio::time::sleep(YELLOW_DELAY).await;
                    return;
                }
                BudgetStatus::Red => {
                    if !blocked {
                        tracing::warn!(
                            remain = self.remain(),
                            "ESI error budget exhausted, holding requests until reset"
                        );
                        blocked = true;
                    }
                    tokio::time::sleep(BLOCKED_POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Summarises call outcomes within the tracking window
    pub fn summary(&self) -> OutcomeSummary {
        let mut state = self.lock();
        trim_outcomes(&mut state, Utc::now());

        state
            .outcomes
            .iter()
            .fold(OutcomeSummary::default(), |mut summary, (_, outcome)| {
                match outcome {
                    CallOutcome::Ok => summary.ok += 1,
                    CallOutcome::NotModified => summary.not_modified += 1,
                    CallOutcome::ErrorLimited => summary.error_limited += 1,
                    CallOutcome::ClientError => summary.client_error += 1,
                    CallOutcome::ServerError => summary.server_error += 1,
                    CallOutcome::Transport => summary.transport += 1,
                }
                summary
            })
    }
}

fn push_outcome(state: &mut TrackerState, outcome: CallOutcome) {
    let now = Utc::now();
    state.outcomes.push_back((now, outcome));
    trim_outcomes(state, now);
}

fn trim_outcomes(state: &mut TrackerState, now: DateTime<Utc>) {
    let cutoff = now - chrono::Duration::seconds(OUTCOME_WINDOW_SECS);

    while let Some((recorded, _)) = state.outcomes.front() {
        if *recorded >= cutoff && state.outcomes.len() <= OUTCOME_CAPACITY {
            break;
        }
        state.outcomes.pop_front();
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn budget_headers(remain: &str, reset: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ERROR_LIMIT_REMAIN_HEADER, HeaderValue::from_str(remain).unwrap());
        headers.insert(ERROR_LIMIT_RESET_HEADER, HeaderValue::from_str(reset).unwrap());
        headers
    }

    #[tokio::test]
    async fn fresh_tracker_proceeds() {
        let tracker = EsiTracker::new();

        assert_eq!(tracker.status(), BudgetStatus::Green);
        assert!(tracker.watchman());
    }

    #[tokio::test]
    async fn status_follows_reported_budget() {
        let tracker = EsiTracker::new();

        tracker.record_response(200, &budget_headers("50", "30"));
        assert_eq!(tracker.status(), BudgetStatus::Green);

        tracker.record_response(502, &budget_headers("15", "30"));
        assert_eq!(tracker.status(), BudgetStatus::Yellow);
        assert!(tracker.watchman());

        tracker.record_response(502, &budget_headers("5", "30"));
        assert_eq!(tracker.status(), BudgetStatus::Red);
        assert!(!tracker.watchman());
    }

    #[tokio::test]
    async fn missing_headers_keep_previous_budget() {
        let tracker = EsiTracker::new();
        tracker.update_budget(5, 30);

        tracker.record_response(200, &HeaderMap::new());

        assert_eq!(tracker.remain(), 5);
        assert!(!tracker.watchman());
    }

    #[tokio::test]
    async fn error_limited_response_exhausts_budget() {
        let tracker = EsiTracker::new();

        tracker.record_response(420, &HeaderMap::new());

        assert_eq!(tracker.remain(), 0);
        assert!(!tracker.watchman());
    }

    #[tokio::test(start_paused = true)]
    async fn watchman_recovers_after_reset() {
        let tracker = EsiTracker::new();
        tracker.update_budget(3, 10);
        assert!(!tracker.watchman());

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(tracker.watchman());
    }

    #[tokio::test(start_paused = true)]
    async fn gate_keeper_blocks_until_budget_refreshed() {
        let tracker = EsiTracker::new();
        tracker.update_budget(2, 3600);

        let gate = tokio::spawn({
            let tracker = tracker.clone();
            async move { tracker.gate_keeper().await }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!gate.is_finished(), "gate keeper should block on red budget");

        tracker.update_budget(100, 60);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(gate.is_finished(), "gate keeper should release after refresh");
    }

    #[tokio::test]
    async fn summary_counts_outcomes() {
        let tracker = EsiTracker::new();

        tracker.record_response(200, &HeaderMap::new());
        tracker.record_response(304, &HeaderMap::new());
        tracker.record_response(404, &HeaderMap::new());
        tracker.record_response(503, &HeaderMap::new());
        tracker.record_transport_failure();

        let summary = tracker.summary();

        assert_eq!(summary.ok, 1);
        assert_eq!(summary.not_modified, 1);
        assert_eq!(summary.client_error, 1);
        assert_eq!(summary.server_error, 1);
        assert_eq!(summary.transport, 1);
    }
}
