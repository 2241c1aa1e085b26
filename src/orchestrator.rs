use crate::chart::{build_series, ChartPoint};
use crate::error::AppError;
use crate::format::{format_count, format_delta};
use crate::models::{
    GlobalSnapshot, HistoricalTimeline, MetricKind, RegionOption, RegionRecord, Selection,
    Viewport,
};
use crate::projection::{project_markers, MapMarker};
use crate::ranking::rank;
use crate::services::StatsService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Tag carried by every snapshot fetch. A response is applied only while
/// its ticket is still the latest one issued.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FetchTicket {
    pub selection: Selection,
    pub generation: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ApplyOutcome {
    Applied,
    /// A newer selection was issued while this response was in flight.
    Stale,
    Failed,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RegionsOutcome {
    Applied,
    /// The active selection is not in the fresh collection.
    OrphanedSelection(String),
    Failed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FailedRequest {
    Snapshot,
    Regions,
    Timeline,
}

#[derive(Clone, PartialEq, Debug)]
pub struct RequestFailure {
    pub request: FailedRequest,
    pub message: String,
    pub retryable: bool,
}

/// Everything the dashboard shows. Mutated only through the methods below.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DashboardState {
    pub selection: Selection,
    pub metric: MetricKind,
    pub snapshot: GlobalSnapshot,
    pub regions: Vec<RegionRecord>,
    pub regions_loaded: bool,
    pub timeline: HistoricalTimeline,
    pub viewport: Viewport,
    pub loading: bool,
    pub failures: Vec<RequestFailure>,
    pub notice: Option<String>,
    generation: u64,
}

impl DashboardState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn issue(&mut self, selection: Selection) -> FetchTicket {
        self.generation += 1;
        self.selection = selection.clone();
        self.loading = true;
        self.clear_failure(FailedRequest::Snapshot);
        FetchTicket {
            selection,
            generation: self.generation,
        }
    }

    /// Switches the selection right away and hands back the ticket for the
    /// fetch. Codes missing from an already loaded collection are refused
    /// without touching the selection.
    pub fn begin_selection(&mut self, selection: Selection) -> Result<FetchTicket, AppError> {
        if let Selection::Region(code) = &selection {
            if self.regions_loaded && !self.regions.iter().any(|r| r.matches(code)) {
                let err = AppError::UnknownRegion(code.clone());
                self.notice = Some(err.user_friendly_message());
                return Err(err);
            }
        }
        Ok(self.issue(selection))
    }

    pub fn reissue_current(&mut self) -> FetchTicket {
        self.issue(self.selection.clone())
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && ticket.selection == self.selection
    }

    pub fn apply_snapshot(
        &mut self,
        ticket: &FetchTicket,
        result: Result<GlobalSnapshot, AppError>,
    ) -> ApplyOutcome {
        if !self.is_current(ticket) {
            return ApplyOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.viewport = Viewport::for_selection(&self.selection, &snapshot);
                self.snapshot = snapshot;
                ApplyOutcome::Applied
            }
            Err(e) => {
                self.viewport = self.known_viewport();
                self.record_failure(FailedRequest::Snapshot, &e);
                ApplyOutcome::Failed
            }
        }
    }

    /// Viewport for the current selection without a resolved snapshot, taken
    /// from the matching record of the loaded collection.
    fn known_viewport(&self) -> Viewport {
        match &self.selection {
            Selection::Worldwide => Viewport::worldwide(),
            Selection::Region(code) => self
                .regions
                .iter()
                .find(|r| r.matches(code))
                .map(|r| Viewport::region(r.coordinate()))
                .unwrap_or(self.viewport),
        }
    }

    pub fn apply_regions(&mut self, result: Result<Vec<RegionRecord>, AppError>) -> RegionsOutcome {
        match result {
            Ok(records) => {
                self.regions = records;
                self.regions_loaded = true;
                self.clear_failure(FailedRequest::Regions);
                match &self.selection {
                    Selection::Region(code) if !self.regions.iter().any(|r| r.matches(code)) => {
                        let code = code.clone();
                        self.notice =
                            Some(AppError::UnknownRegion(code.clone()).user_friendly_message());
                        RegionsOutcome::OrphanedSelection(code)
                    }
                    _ => RegionsOutcome::Applied,
                }
            }
            Err(e) => {
                self.record_failure(FailedRequest::Regions, &e);
                RegionsOutcome::Failed
            }
        }
    }

    pub fn apply_timeline(&mut self, result: Result<HistoricalTimeline, AppError>) -> bool {
        match result {
            Ok(timeline) => {
                self.timeline = timeline;
                self.clear_failure(FailedRequest::Timeline);
                true
            }
            Err(e) => {
                self.record_failure(FailedRequest::Timeline, &e);
                false
            }
        }
    }

    pub fn select_metric(&mut self, metric: MetricKind) {
        self.metric = metric;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Drains the failure list for a retry round.
    pub fn take_failures(&mut self) -> Vec<FailedRequest> {
        self.notice = None;
        self.failures.drain(..).map(|f| f.request).collect()
    }

    fn record_failure(&mut self, request: FailedRequest, err: &AppError) {
        self.clear_failure(request);
        self.failures.push(RequestFailure {
            request,
            message: err.user_friendly_message(),
            retryable: err.is_retryable(),
        });
    }

    fn clear_failure(&mut self, request: FailedRequest) {
        self.failures.retain(|f| f.request != request);
    }

    pub fn ordering(&self) -> Vec<RegionRecord> {
        rank(&self.regions, self.metric)
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        project_markers(&self.regions, self.metric)
    }

    pub fn series(&self) -> Vec<ChartPoint> {
        build_series(&self.timeline, self.metric)
    }

    pub fn options(&self) -> Vec<RegionOption> {
        let mut options = vec![RegionOption {
            name: "Worldwide".to_string(),
            value: Selection::Worldwide.value().to_string(),
        }];
        options.extend(self.regions.iter().filter_map(|r| {
            r.code().map(|code| RegionOption {
                name: r.country.clone(),
                value: code.to_string(),
            })
        }));
        options
    }

    pub fn view(&self) -> DashboardView {
        let counters = &self.snapshot.counters;
        let cards = MetricKind::all()
            .iter()
            .map(|&metric| StatCard {
                metric,
                title: metric.title(),
                today: format_delta(counters.today(metric)),
                total: format_count(counters.total(metric)),
                active: metric == self.metric,
            })
            .collect();

        let selected = self.selection.code();
        let table = self
            .ordering()
            .into_iter()
            .map(|r| TableRow {
                selected: selected.is_some_and(|code| r.matches(code)),
                code: r.code().map(str::to_string),
                total: format_count(r.total(self.metric)),
                name: r.country,
            })
            .collect();

        let retryable = self.failures.iter().any(|f| f.retryable);
        let error = match (&self.notice, self.failures.last()) {
            (Some(message), _) => Some(ErrorBanner {
                message: message.clone(),
                retryable,
            }),
            (None, Some(failure)) => Some(ErrorBanner {
                message: failure.message.clone(),
                retryable,
            }),
            (None, None) => None,
        };

        DashboardView {
            selection: self.selection.clone(),
            metric: self.metric,
            options: self.options(),
            cards,
            table,
            viewport: self.viewport,
            markers: self.markers(),
            series: self.series(),
            loading: self.loading,
            error,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct StatCard {
    pub metric: MetricKind,
    pub title: &'static str,
    pub today: String,
    pub total: String,
    pub active: bool,
}

#[derive(Clone, PartialEq, Debug)]
pub struct TableRow {
    pub code: Option<String>,
    pub name: String,
    pub total: String,
    pub selected: bool,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ErrorBanner {
    pub message: String,
    pub retryable: bool,
}

/// What the presentation layer renders.
#[derive(Clone, PartialEq, Debug)]
pub struct DashboardView {
    pub selection: Selection,
    pub metric: MetricKind,
    pub options: Vec<RegionOption>,
    pub cards: Vec<StatCard>,
    pub table: Vec<TableRow>,
    pub viewport: Viewport,
    pub markers: Vec<MapMarker>,
    pub series: Vec<ChartPoint>,
    pub loading: bool,
    pub error: Option<ErrorBanner>,
}

/// Owns the dashboard state and drives every fetch against it. Clones share
/// the same state.
#[derive(Clone)]
pub struct Orchestrator<S: StatsService> {
    service: S,
    history_days: u32,
    state: Arc<watch::Sender<DashboardState>>,
}

impl<S: StatsService> Orchestrator<S> {
    pub fn new(service: S, history_days: u32) -> Self {
        let (tx, _) = watch::channel(DashboardState::default());
        Self {
            service,
            history_days,
            state: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> DashboardView {
        self.state.borrow().view()
    }

    fn update<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut out = None;
        self.state.send_modify(|state| out = Some(f(state)));
        out.unwrap_or_else(|| unreachable!("send_modify runs its closure once"))
    }

    /// First load: worldwide snapshot, region collection and timeline, all in
    /// flight at once and applied in whatever order they land.
    pub async fn initialize(&self) {
        info!("Loading dashboard data");
        let ticket = self.update(|s| s.reissue_current());
        tokio::join!(
            self.load_snapshot(ticket),
            self.load_regions(),
            self.load_timeline()
        );
    }

    /// User picked a region (or the worldwide sentinel). The selection
    /// switches immediately; the snapshot follows when the fetch lands.
    pub async fn select_region(&self, value: &str) -> Result<ApplyOutcome, AppError> {
        let selection = match Selection::parse(value) {
            Ok(selection) => selection,
            Err(e) => {
                let message = e.user_friendly_message();
                self.update(|s| s.notice = Some(message));
                return Err(e);
            }
        };
        let ticket = self.update(|s| {
            s.dismiss_notice();
            s.begin_selection(selection)
        })?;
        info!("Selected {}", ticket.selection);
        Ok(self.load_snapshot(ticket).await)
    }

    pub fn select_metric(&self, metric: MetricKind) {
        debug!("Metric switched to {}", metric);
        self.update(|s| s.select_metric(metric));
    }

    /// Re-issues every request whose last attempt failed.
    pub async fn retry(&self) {
        let failed = self.update(|s| s.take_failures());
        if failed.is_empty() {
            return;
        }
        info!("Retrying {:?}", failed);

        let snapshot = async {
            if failed.contains(&FailedRequest::Snapshot) {
                let ticket = self.update(|s| s.reissue_current());
                self.load_snapshot(ticket).await;
            }
        };
        let regions = async {
            if failed.contains(&FailedRequest::Regions) {
                self.load_regions().await;
            }
        };
        let timeline = async {
            if failed.contains(&FailedRequest::Timeline) {
                self.load_timeline().await;
            }
        };
        tokio::join!(snapshot, regions, timeline);
    }

    /// Re-fetches everything for the current selection.
    pub async fn refresh(&self) {
        debug!("Refreshing dashboard data");
        let ticket = self.update(|s| s.reissue_current());
        tokio::join!(
            self.load_snapshot(ticket),
            self.load_regions(),
            self.load_timeline()
        );
    }

    pub async fn run_refresh_loop(&self, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            self.refresh().await;
        }
    }

    async fn load_snapshot(&self, ticket: FetchTicket) -> ApplyOutcome {
        let result = self.service.fetch_snapshot(&ticket.selection).await;
        if let Err(e) = &result {
            error!("Failed to fetch snapshot for {}: {}", ticket.selection, e);
        }
        let outcome = self.update(|s| s.apply_snapshot(&ticket, result));
        if outcome == ApplyOutcome::Stale {
            debug!(
                "Discarding stale snapshot for {} (generation {})",
                ticket.selection, ticket.generation
            );
        }
        outcome
    }

    async fn load_regions(&self) {
        let result = self.service.fetch_regions().await;
        match &result {
            Ok(records) => info!("Loaded {} regions", records.len()),
            Err(e) => error!("Failed to fetch regions: {}", e),
        }
        if let RegionsOutcome::OrphanedSelection(code) = self.update(|s| s.apply_regions(result)) {
            warn!("Selection {} is not a known region, falling back to worldwide", code);
            let ticket = self.update(|s| s.issue(Selection::Worldwide));
            self.load_snapshot(ticket).await;
        }
    }

    async fn load_timeline(&self) {
        let result = self.service.fetch_timeline(self.history_days).await;
        if let Err(e) = &result {
            error!("Failed to fetch timeline: {}", e);
        }
        self.update(|s| s.apply_timeline(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, Counters, RegionInfo};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Gate = oneshot::Receiver<Result<GlobalSnapshot, AppError>>;

    #[derive(Clone, Default)]
    struct MockStatsService {
        calls: Arc<Mutex<Vec<String>>>,
        regions: Arc<Mutex<Vec<RegionRecord>>>,
        gates: Arc<Mutex<HashMap<String, Gate>>>,
        fail_regions: Arc<AtomicBool>,
        fail_snapshots: Arc<AtomicBool>,
    }

    impl MockStatsService {
        fn with_regions(regions: Vec<RegionRecord>) -> Self {
            let mock = Self::default();
            *mock.regions.lock().unwrap() = regions;
            mock
        }

        fn gate(&self, selection: &str) -> oneshot::Sender<Result<GlobalSnapshot, AppError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(selection.to_string(), rx);
            tx
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
        }

        async fn wait_for_count(&self, call: &str, n: usize) {
            for _ in 0..100 {
                if self.count(call) >= n {
                    return;
                }
                tokio::task::yield_now().await;
            }
            panic!("{} was requested fewer than {} times", call, n);
        }

        fn called(&self, call: &str) -> bool {
            self.calls.lock().unwrap().iter().any(|c| c == call)
        }

        async fn wait_for(&self, call: &str) {
            for _ in 0..100 {
                if self.called(call) {
                    return;
                }
                tokio::task::yield_now().await;
            }
            panic!("{} was never requested", call);
        }
    }

    fn unavailable() -> AppError {
        AppError::Api {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "down".to_string(),
        }
    }

    #[async_trait]
    impl StatsService for MockStatsService {
        async fn fetch_snapshot(&self, selection: &Selection) -> Result<GlobalSnapshot, AppError> {
            let key = selection.value().to_string();
            self.calls.lock().unwrap().push(format!("snapshot:{}", key));
            let gate = self.gates.lock().unwrap().remove(&key);
            if let Some(rx) = gate {
                return rx.await.unwrap_or_else(|_| Err(unavailable()));
            }
            if self.fail_snapshots.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            Ok(match selection {
                Selection::Worldwide => snapshot(None, 1_000),
                Selection::Region(code) => {
                    let regions = self.regions.lock().unwrap();
                    let record = regions.iter().find(|r| r.matches(code));
                    snapshot(record.map(|r| r.region.clone()), 10)
                }
            })
        }

        async fn fetch_regions(&self) -> Result<Vec<RegionRecord>, AppError> {
            self.calls.lock().unwrap().push("regions".to_string());
            if self.fail_regions.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            Ok(self.regions.lock().unwrap().clone())
        }

        async fn fetch_timeline(&self, days: u32) -> Result<HistoricalTimeline, AppError> {
            self.calls.lock().unwrap().push(format!("timeline:{}", days));
            Ok(HistoricalTimeline::default())
        }
    }

    fn record(code: &str, cases: i64, lat: f64, long: f64) -> RegionRecord {
        RegionRecord {
            country: format!("Country {}", code),
            region: RegionInfo {
                iso2: Some(code.to_string()),
                lat,
                long,
            },
            counters: Counters {
                cases: Some(cases),
                ..Default::default()
            },
        }
    }

    fn snapshot(region: Option<RegionInfo>, cases: i64) -> GlobalSnapshot {
        GlobalSnapshot {
            counters: Counters {
                cases: Some(cases),
                today_cases: Some(cases / 10),
                ..Default::default()
            },
            region,
        }
    }

    fn sample_regions() -> Vec<RegionRecord> {
        vec![
            record("X", 100, 10.0, 20.0),
            record("Y", 50, -5.0, 30.0),
            record("Z", 200, 45.0, -100.0),
        ]
    }

    fn region_info(code: &str, lat: f64, long: f64) -> RegionInfo {
        RegionInfo {
            iso2: Some(code.to_string()),
            lat,
            long,
        }
    }

    #[test]
    fn begin_selection_switches_immediately() {
        let mut state = DashboardState::default();
        let ticket = state
            .begin_selection(Selection::Region("FR".to_string()))
            .unwrap();
        assert_eq!(state.selection, Selection::Region("FR".to_string()));
        assert!(state.loading);
        assert_eq!(ticket.generation, state.generation());
    }

    #[test]
    fn unknown_code_rejected_once_regions_loaded() {
        let mut state = DashboardState::default();
        state.apply_regions(Ok(sample_regions()));
        let before = state.clone();
        let err = state
            .begin_selection(Selection::Region("QQ".to_string()))
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownRegion(ref c) if c == "QQ"));
        assert_eq!(state.selection, before.selection);
        assert_eq!(state.generation(), before.generation());
        assert!(state.view().error.is_some());
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut state = DashboardState::default();
        let a = state.begin_selection(Selection::Region("A".to_string())).unwrap();
        let b = state.begin_selection(Selection::Region("B".to_string())).unwrap();

        let b_info = region_info("B", 1.0, 2.0);
        assert_eq!(
            state.apply_snapshot(&b, Ok(snapshot(Some(b_info.clone()), 5))),
            ApplyOutcome::Applied
        );
        assert_eq!(
            state.apply_snapshot(&a, Ok(snapshot(Some(region_info("A", 9.0, 9.0)), 7))),
            ApplyOutcome::Stale
        );
        assert_eq!(state.snapshot.region, Some(b_info));
        assert_eq!(state.viewport, Viewport::region(Coordinate::new(1.0, 2.0)));
        assert!(!state.loading);
    }

    #[test]
    fn reselecting_same_code_still_discards_older_ticket() {
        let mut state = DashboardState::default();
        let first = state.begin_selection(Selection::Region("A".to_string())).unwrap();
        let _ = state.begin_selection(Selection::Region("B".to_string())).unwrap();
        let again = state.begin_selection(Selection::Region("A".to_string())).unwrap();
        assert_eq!(state.apply_snapshot(&first, Ok(snapshot(None, 1))), ApplyOutcome::Stale);
        assert!(state.loading);
        assert_eq!(state.apply_snapshot(&again, Ok(snapshot(None, 2))), ApplyOutcome::Applied);
    }

    #[test]
    fn failure_clears_loading_and_is_retryable() {
        let mut state = DashboardState::default();
        let ticket = state.reissue_current();
        assert_eq!(state.apply_snapshot(&ticket, Err(unavailable())), ApplyOutcome::Failed);
        assert!(!state.loading);
        let banner = state.view().error.unwrap();
        assert!(banner.retryable);
        assert_eq!(state.take_failures(), vec![FailedRequest::Snapshot]);
        assert!(state.view().error.is_none());
    }

    #[test]
    fn failed_region_fetch_still_moves_viewport() {
        let mut state = DashboardState::default();
        state.apply_regions(Ok(sample_regions()));
        let ticket = state.begin_selection(Selection::Region("X".to_string())).unwrap();
        assert_eq!(state.apply_snapshot(&ticket, Err(unavailable())), ApplyOutcome::Failed);
        assert_eq!(state.viewport, Viewport::region(Coordinate::new(10.0, 20.0)));

        let ticket = state.begin_selection(Selection::Worldwide).unwrap();
        state.apply_snapshot(&ticket, Err(unavailable()));
        assert_eq!(state.viewport, Viewport::worldwide());
    }

    #[test]
    fn notice_keeps_retry_available_for_pending_failures() {
        let mut state = DashboardState::default();
        state.apply_timeline(Err(unavailable()));
        state.apply_regions(Ok(sample_regions()));
        assert!(state.begin_selection(Selection::Region("QQ".to_string())).is_err());

        let banner = state.view().error.unwrap();
        assert_eq!(banner.message, state.notice.clone().unwrap());
        assert!(banner.retryable);

        assert_eq!(state.take_failures(), vec![FailedRequest::Timeline]);
        assert!(state.view().error.is_none());
    }

    #[test]
    fn regions_missing_current_selection_are_orphaned() {
        let mut state = DashboardState::default();
        state.begin_selection(Selection::Region("QQ".to_string())).unwrap();
        assert_eq!(
            state.apply_regions(Ok(sample_regions())),
            RegionsOutcome::OrphanedSelection("QQ".to_string())
        );
        assert!(state.notice.is_some());
    }

    #[test]
    fn view_formats_cards_and_orders_table() {
        let mut state = DashboardState::default();
        state.apply_regions(Ok(sample_regions()));
        let ticket = state.reissue_current();
        state.apply_snapshot(&ticket, Ok(snapshot(None, 1_234_567)));

        let view = state.view();
        let cases = &view.cards[0];
        assert_eq!(cases.metric, MetricKind::Cases);
        assert_eq!(cases.total, "1,234,567");
        assert_eq!(cases.today, "+123.5k");
        assert!(cases.active);
        assert_eq!(view.cards[2].total, crate::format::MISSING_PLACEHOLDER);

        let order: Vec<_> = view.table.iter().map(|r| r.code.clone().unwrap()).collect();
        assert_eq!(order, vec!["Z", "X", "Y"]);
        assert_eq!(view.markers.len(), 3);
        assert_eq!(view.options.len(), 4);
        assert_eq!(view.options[0].value, "worldwide");
    }

    #[tokio::test]
    async fn initialize_populates_everything() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Worldwide);
        assert_eq!(state.snapshot.counters.cases, Some(1_000));
        assert_eq!(state.regions.len(), 3);
        assert_eq!(state.viewport, Viewport::worldwide());
        assert!(!state.loading);
        assert!(service.called("snapshot:worldwide"));
        assert!(service.called("regions"));
        assert!(service.called("timeline:30"));
        assert_eq!(service.call_count(), 3);
    }

    #[tokio::test]
    async fn initialize_failure_leaves_defaults_and_retry_recovers() {
        let service = MockStatsService::with_regions(sample_regions());
        service.fail_regions.store(true, Ordering::SeqCst);
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        let view = dashboard.view();
        assert!(view.table.is_empty());
        assert!(!view.loading);
        assert!(view.error.as_ref().is_some_and(|e| e.retryable));

        service.fail_regions.store(false, Ordering::SeqCst);
        let before = service.call_count();
        dashboard.retry().await;
        assert_eq!(service.call_count(), before + 1);
        assert_eq!(dashboard.state().regions.len(), 3);
        assert!(dashboard.view().error.is_none());
    }

    #[tokio::test]
    async fn select_region_updates_snapshot_and_viewport() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        let before = service.call_count();
        let outcome = dashboard.select_region("z").await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(service.call_count(), before + 1);

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Region("Z".to_string()));
        assert_eq!(state.viewport, Viewport::region(Coordinate::new(45.0, -100.0)));
        assert!(!state.loading);
        assert!(dashboard.view().table.iter().any(|r| r.selected && r.name == "Country Z"));

        dashboard.select_region("worldwide").await.unwrap();
        assert_eq!(dashboard.state().viewport, Viewport::worldwide());
    }

    #[tokio::test]
    async fn unknown_region_issues_no_fetch() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        let before = service.call_count();
        let err = dashboard.select_region("QQ").await.unwrap_err();
        assert!(matches!(err, AppError::UnknownRegion(_)));
        assert_eq!(service.call_count(), before);
        assert_eq!(dashboard.state().selection, Selection::Worldwide);
        assert!(dashboard.view().error.is_some_and(|e| !e.retryable));
    }

    #[tokio::test]
    async fn late_response_for_older_selection_is_discarded() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        let release_x = service.gate("X");
        let release_y = service.gate("Y");

        let first = dashboard.clone();
        let task_x = tokio::spawn(async move { first.select_region("X").await });
        service.wait_for("snapshot:X").await;

        let second = dashboard.clone();
        let task_y = tokio::spawn(async move { second.select_region("Y").await });
        service.wait_for("snapshot:Y").await;
        assert_eq!(dashboard.state().selection, Selection::Region("Y".to_string()));
        assert!(dashboard.state().loading);

        release_y
            .send(Ok(snapshot(Some(region_info("Y", -5.0, 30.0)), 50)))
            .unwrap();
        assert_eq!(task_y.await.unwrap().unwrap(), ApplyOutcome::Applied);

        release_x
            .send(Ok(snapshot(Some(region_info("X", 10.0, 20.0)), 100)))
            .unwrap();
        assert_eq!(task_x.await.unwrap().unwrap(), ApplyOutcome::Stale);

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Region("Y".to_string()));
        assert_eq!(state.snapshot.counters.cases, Some(50));
        assert_eq!(state.viewport, Viewport::region(Coordinate::new(-5.0, 30.0)));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn selection_during_initialize_wins_over_worldwide() {
        let service = MockStatsService::with_regions(sample_regions());
        let release_world = service.gate("worldwide");
        let dashboard = Orchestrator::new(service.clone(), 30);

        let init = dashboard.clone();
        let init_task = tokio::spawn(async move { init.initialize().await });
        service.wait_for("snapshot:worldwide").await;

        dashboard.select_region("X").await.unwrap();
        release_world.send(Ok(snapshot(None, 1_000))).unwrap();
        init_task.await.unwrap();

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Region("X".to_string()));
        assert_eq!(state.snapshot.counters.cases, Some(10));
    }

    #[tokio::test]
    async fn metric_switch_never_fetches() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        let before = service.call_count();
        dashboard.select_metric(MetricKind::Deaths);
        dashboard.select_metric(MetricKind::Recovered);
        assert_eq!(service.call_count(), before);

        let view = dashboard.view();
        assert_eq!(view.metric, MetricKind::Recovered);
        assert!(view.cards[1].active);
        assert!(view.markers.iter().all(|m| m.color == MetricKind::Recovered.color()));
    }

    #[tokio::test]
    async fn failed_selection_surfaces_error_and_clears_loading() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;

        service.fail_snapshots.store(true, Ordering::SeqCst);
        let outcome = dashboard.select_region("X").await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Failed);
        let state = dashboard.state();
        assert!(!state.loading);
        assert_eq!(state.selection, Selection::Region("X".to_string()));

        service.fail_snapshots.store(false, Ordering::SeqCst);
        dashboard.retry().await;
        let state = dashboard.state();
        assert_eq!(state.snapshot.counters.cases, Some(10));
        assert!(state.failures.is_empty());
    }

    #[tokio::test]
    async fn refresh_refetches_everything_for_current_selection() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;
        dashboard.select_region("X").await.unwrap();

        dashboard.refresh().await;
        assert_eq!(service.count("regions"), 2);
        assert_eq!(service.count("timeline:30"), 2);
        assert_eq!(service.count("snapshot:X"), 2);
        assert_eq!(service.count("snapshot:worldwide"), 1);

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Region("X".to_string()));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn selection_during_refresh_wins() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);
        dashboard.initialize().await;
        dashboard.select_region("X").await.unwrap();

        let release_x = service.gate("X");
        let refresher = dashboard.clone();
        let refresh_task = tokio::spawn(async move { refresher.refresh().await });
        service.wait_for_count("snapshot:X", 2).await;

        let outcome = dashboard.select_region("Y").await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);

        release_x
            .send(Ok(snapshot(Some(region_info("X", 10.0, 20.0)), 999)))
            .unwrap();
        refresh_task.await.unwrap();

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Region("Y".to_string()));
        assert_eq!(state.snapshot.counters.cases, Some(10));
        assert_eq!(state.viewport, Viewport::region(Coordinate::new(-5.0, 30.0)));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn refresh_loop_runs_on_interval() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);

        let looper = dashboard.clone();
        let task =
            tokio::spawn(async move { looper.run_refresh_loop(Duration::from_millis(5)).await });
        for _ in 0..200 {
            if service.count("regions") >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        task.abort();
        assert!(service.count("regions") >= 2);
        assert!(service.count("timeline:30") >= 2);
    }

    #[tokio::test]
    async fn orphaned_selection_falls_back_to_worldwide() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service.clone(), 30);

        dashboard.select_region("QQ").await.unwrap();
        assert_eq!(dashboard.state().selection, Selection::Region("QQ".to_string()));

        dashboard.initialize().await;
        assert!(service.called("snapshot:worldwide"));

        let state = dashboard.state();
        assert_eq!(state.selection, Selection::Worldwide);
        assert_eq!(state.viewport, Viewport::worldwide());
        assert_eq!(state.snapshot.counters.cases, Some(1_000));
        assert!(state.notice.is_some());
        assert!(!state.loading);
        assert!(dashboard.view().error.is_some_and(|e| !e.retryable));
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let service = MockStatsService::with_regions(sample_regions());
        let dashboard = Orchestrator::new(service, 30);
        let mut rx = dashboard.subscribe();
        dashboard.select_metric(MetricKind::Deaths);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().metric, MetricKind::Deaths);
    }
}
