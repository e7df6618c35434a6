/// View coordinator for the verification console
///
/// Owns the current snapshot, the filter state and the refresh lifecycle.
/// Stats and the filtered list are recomputed wholesale whenever either
/// input changes; nothing is patched in place.
///
/// # Phases
///
/// `Idle -> Loading -> Ready` on the first fetch, `Ready -> Refreshing ->
/// Ready` on every later one. A failed fetch raises `fetch_failed` and still
/// lands in `Ready`:
/// - failed initial load: stats and list reset to empty defaults
/// - failed refresh: previous data is kept
use crate::{
    error::{KlikError, KlikResult},
    metrics,
    verification::{
        filter::filter_requests,
        models::{FilterState, StatusFilter, VerificationRequest},
        source::RecordSource,
        stats::{compute_stats_at, monthly_submissions, MonthlyBucket, StatCards, Stats, LAST_WEEK_DAYS},
    },
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Lifecycle phase of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsolePhase {
    Idle,
    Loading,
    Ready,
    Refreshing,
}

/// Who asked for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// User pressed refresh; the outcome is reported
    Manual,
    /// Change feed or background job; data updates quietly
    Silent,
}

/// Signal for the presentation layer to surface to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConsoleNotice {
    LoadFailed { message: String },
    RefreshSucceeded { total: usize },
    RefreshFailed { message: String },
}

impl ConsoleNotice {
    pub fn is_failure(&self) -> bool {
        !matches!(self, ConsoleNotice::RefreshSucceeded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Load,
    Refresh(RefreshMode),
}

/// An outstanding fetch, handed back to `complete_fetch`
#[derive(Debug)]
#[must_use]
pub struct FetchTicket {
    kind: FetchKind,
}

impl FetchTicket {
    pub fn trigger(&self) -> &'static str {
        match self.kind {
            FetchKind::Load => "load",
            FetchKind::Refresh(RefreshMode::Manual) => "manual",
            FetchKind::Refresh(RefreshMode::Silent) => "silent",
        }
    }
}

/// Everything the console screen renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleView {
    pub phase: ConsolePhase,
    pub stats: Stats,
    pub cards: StatCards,
    pub filter: FilterState,
    pub has_active_filters: bool,
    pub requests: Vec<VerificationRequest>,
    pub refreshing: bool,
    pub fetch_failed: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Fetch a snapshot and record its outcome
pub async fn fetch_snapshot(
    source: &dyn RecordSource,
    trigger: &str,
) -> KlikResult<Vec<VerificationRequest>> {
    let start = Instant::now();
    let result = source.fetch_all().await;
    metrics::record_fetch(trigger, result.is_ok(), start.elapsed().as_secs_f64());
    result
}

/// Console state machine over one record source
pub struct ViewCoordinator {
    source: Arc<dyn RecordSource>,
    window: Duration,
    snapshot: Vec<VerificationRequest>,
    stats: Stats,
    filter: FilterState,
    filtered: Vec<VerificationRequest>,
    /// At least one fetch has completed, successfully or not
    settled: bool,
    in_flight: usize,
    manual_in_flight: bool,
    fetch_failed: bool,
    last_synced_at: Option<DateTime<Utc>>,
    notices: broadcast::Sender<ConsoleNotice>,
}

impl ViewCoordinator {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        let (notices, _) = broadcast::channel(64);
        Self {
            source,
            window: Duration::days(LAST_WEEK_DAYS),
            snapshot: Vec::new(),
            stats: Stats::default(),
            filter: FilterState::default(),
            filtered: Vec::new(),
            settled: false,
            in_flight: 0,
            manual_in_flight: false,
            fetch_failed: false,
            last_synced_at: None,
            notices,
        }
    }

    /// Use a different "last week" window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn source(&self) -> Arc<dyn RecordSource> {
        Arc::clone(&self.source)
    }

    /// Receive user-facing notices
    pub fn subscribe_notices(&self) -> broadcast::Receiver<ConsoleNotice> {
        self.notices.subscribe()
    }

    pub fn phase(&self) -> ConsolePhase {
        match (self.in_flight > 0, self.settled) {
            (true, false) => ConsolePhase::Loading,
            (true, true) => ConsolePhase::Refreshing,
            (false, true) => ConsolePhase::Ready,
            (false, false) => ConsolePhase::Idle,
        }
    }

    pub fn snapshot(&self) -> &[VerificationRequest] {
        &self.snapshot
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn filtered(&self) -> &[VerificationRequest] {
        &self.filtered
    }

    pub fn has_active_filters(&self) -> bool {
        self.filter.has_active_filters()
    }

    /// True while a manual refresh would be rejected
    pub fn is_refreshing(&self) -> bool {
        self.manual_in_flight || self.phase() == ConsolePhase::Loading
    }

    /// The last completed fetch failed; a manual refresh may recover
    pub fn fetch_failed(&self) -> bool {
        self.fetch_failed
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn view(&self) -> ConsoleView {
        ConsoleView {
            phase: self.phase(),
            stats: self.stats,
            cards: self.stats.cards(),
            filter: self.filter.clone(),
            has_active_filters: self.has_active_filters(),
            requests: self.filtered.clone(),
            refreshing: self.is_refreshing(),
            fetch_failed: self.fetch_failed,
            last_synced_at: self.last_synced_at,
        }
    }

    /// Monthly submission counts over the current snapshot
    pub fn monthly(&self, months: u32, now: DateTime<Utc>) -> Vec<MonthlyBucket> {
        monthly_submissions(&self.snapshot, months, now)
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Replace the filter state and recompute the visible list
    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.filtered = filter_requests(&self.snapshot, &self.filter);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        let filter = FilterState::new(query, self.filter.status_filter);
        self.set_filter(filter);
    }

    pub fn set_status_filter(&mut self, status_filter: StatusFilter) {
        let filter = FilterState::new(self.filter.search_query.clone(), status_filter);
        self.set_filter(filter);
    }

    /// Reset filters to their defaults. Returns false when none were active.
    pub fn clear_filters(&mut self) -> bool {
        if !self.has_active_filters() {
            return false;
        }
        self.set_filter(FilterState::default());
        true
    }

    // ========================================================================
    // Fetch lifecycle
    // ========================================================================

    /// Start the initial load
    pub fn begin_load(&mut self) -> KlikResult<FetchTicket> {
        if self.phase() != ConsolePhase::Idle {
            return Err(KlikError::Conflict("Console already loaded".to_string()));
        }
        self.in_flight += 1;
        Ok(FetchTicket {
            kind: FetchKind::Load,
        })
    }

    /// Start a refresh; from `Idle` this is the initial load
    pub fn begin_refresh(&mut self, mode: RefreshMode) -> KlikResult<FetchTicket> {
        if self.phase() == ConsolePhase::Idle {
            return self.begin_load();
        }

        if mode == RefreshMode::Manual {
            if self.is_refreshing() {
                return Err(KlikError::Conflict("Refresh already in progress".to_string()));
            }
            self.manual_in_flight = true;
        }

        self.in_flight += 1;
        Ok(FetchTicket {
            kind: FetchKind::Refresh(mode),
        })
    }

    /// Apply the result of a fetch started with `begin_load`/`begin_refresh`
    ///
    /// Whichever fetch completes last determines the state.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: KlikResult<Vec<VerificationRequest>>,
    ) -> KlikResult<usize> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if ticket.kind == FetchKind::Refresh(RefreshMode::Manual) {
            self.manual_in_flight = false;
        }

        match result {
            Ok(snapshot) => {
                let total = snapshot.len();
                self.apply_snapshot(snapshot);
                self.settled = true;
                self.fetch_failed = false;
                self.last_synced_at = Some(Utc::now());
                debug!(trigger = ticket.trigger(), total, "verification snapshot applied");

                if ticket.kind == FetchKind::Refresh(RefreshMode::Manual) {
                    self.notify(ConsoleNotice::RefreshSucceeded { total });
                }
                Ok(total)
            }
            Err(e) => {
                self.fetch_failed = true;
                match ticket.kind {
                    FetchKind::Load => {
                        warn!(error = %e, "initial verification load failed");
                        // A refresh that already succeeded keeps its data
                        if self.last_synced_at.is_none() {
                            self.apply_snapshot(Vec::new());
                        }
                        self.notify(ConsoleNotice::LoadFailed {
                            message: e.to_string(),
                        });
                    }
                    FetchKind::Refresh(RefreshMode::Manual) => {
                        warn!(error = %e, "manual verification refresh failed");
                        self.notify(ConsoleNotice::RefreshFailed {
                            message: e.to_string(),
                        });
                    }
                    FetchKind::Refresh(RefreshMode::Silent) => {
                        warn!(error = %e, "silent verification refresh failed");
                    }
                }
                self.settled = true;
                Err(e)
            }
        }
    }

    /// Initial load: `Idle -> Loading -> Ready`
    pub async fn load(&mut self) -> KlikResult<usize> {
        let ticket = self.begin_load()?;
        let result = fetch_snapshot(self.source.as_ref(), ticket.trigger()).await;
        self.complete_fetch(ticket, result)
    }

    /// Refetch and recompute, keeping the filter state
    pub async fn refresh(&mut self, mode: RefreshMode) -> KlikResult<usize> {
        let ticket = self.begin_refresh(mode)?;
        let result = fetch_snapshot(self.source.as_ref(), ticket.trigger()).await;
        self.complete_fetch(ticket, result)
    }

    fn apply_snapshot(&mut self, snapshot: Vec<VerificationRequest>) {
        self.stats = compute_stats_at(&snapshot, Utc::now(), self.window);
        self.filtered = filter_requests(&snapshot, &self.filter);
        self.snapshot = snapshot;
    }

    fn notify(&self, notice: ConsoleNotice) {
        // No subscribers is fine: nobody is watching the console
        let _ = self.notices.send(notice);
    }
}

/// Shared handle to a coordinator
///
/// Fetches run without holding the lock so filter edits and reads stay
/// responsive; the lock is taken only to start and to apply a fetch.
#[derive(Clone)]
pub struct ConsoleHandle {
    inner: Arc<RwLock<ViewCoordinator>>,
}

impl ConsoleHandle {
    pub fn new(coordinator: ViewCoordinator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(coordinator)),
        }
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, ViewCoordinator> {
        self.inner.read().await
    }

    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, ViewCoordinator> {
        self.inner.write().await
    }

    pub async fn view(&self) -> ConsoleView {
        self.inner.read().await.view()
    }

    pub async fn load(&self) -> KlikResult<usize> {
        let (ticket, source) = {
            let mut console = self.inner.write().await;
            (console.begin_load()?, console.source())
        };
        self.finish(ticket, source).await
    }

    pub async fn refresh(&self, mode: RefreshMode) -> KlikResult<usize> {
        let (ticket, source) = {
            let mut console = self.inner.write().await;
            (console.begin_refresh(mode)?, console.source())
        };
        self.finish(ticket, source).await
    }

    async fn finish(&self, ticket: FetchTicket, source: Arc<dyn RecordSource>) -> KlikResult<usize> {
        let result = fetch_snapshot(source.as_ref(), ticket.trigger()).await;
        let outcome = self.inner.write().await.complete_fetch(ticket, result);
        if let Ok(total) = outcome {
            info!(total, "verification console synced");
        }
        outcome
    }
}
