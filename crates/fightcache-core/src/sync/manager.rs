use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::FightDataSource;
use crate::cache::CacheManager;
use crate::models::{
    filter_allowed, Dataset, EventInfo, FightHistoryEntry, FightRecord, Fighter, OddsChartPoint,
};

use super::transform;

/// Default freshness window in hours
const DEFAULT_FRESHNESS_HOURS: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }
}

/// What a refresh request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was already in flight
    Coalesced,
    /// Data was inside the freshness window, no requests made
    Skipped,
    Refreshed,
    Failed,
}

/// How startup made the manager usable.
#[derive(Debug)]
pub enum Startup {
    /// Served from cache; a refresh is running in the background
    Hydrated { refresh: JoinHandle<RefreshOutcome> },
    /// No usable cache; a blocking fetch ran instead
    Fetched(RefreshOutcome),
}

/// Owns the published dataset and decides when to go to the network.
///
/// Readers get consistent snapshots through [`SyncManager::dataset`] or a
/// [`watch::Receiver`]; a refresh only swaps the dataset after every fetch
/// in the batch succeeded.
pub struct SyncManager {
    source: Arc<dyn FightDataSource>,
    cache: CacheManager,
    freshness_window: chrono::Duration,
    state: watch::Sender<LoadingState>,
    data: watch::Sender<Arc<Dataset>>,
    odds_prefetched: AtomicBool,
}

impl SyncManager {
    pub fn new(source: Arc<dyn FightDataSource>, cache: CacheManager) -> Self {
        let (state, _) = watch::channel(LoadingState::Idle);
        let (data, _) = watch::channel(Arc::new(Dataset::default()));
        Self {
            source,
            cache,
            freshness_window: chrono::Duration::hours(DEFAULT_FRESHNESS_HOURS),
            state,
            data,
            odds_prefetched: AtomicBool::new(false),
        }
    }

    pub fn with_freshness_window(mut self, window: chrono::Duration) -> Self {
        self.freshness_window = window;
        self
    }

    // ===== Lifecycle =====

    /// Hydrate from cache and refresh in the background, or fall back to a
    /// blocking fetch when there is no usable cache.
    pub async fn start(self: &Arc<Self>) -> Startup {
        if self.hydrate_from_cache() {
            let manager = Arc::clone(self);
            let refresh = tokio::spawn(async move { manager.refresh().await });
            Startup::Hydrated { refresh }
        } else {
            Startup::Fetched(self.force_refresh().await)
        }
    }

    /// Replace the published dataset with the cached snapshot, if complete.
    pub fn hydrate_from_cache(&self) -> bool {
        let Some(cached) = self.cache.load_snapshot() else {
            return false;
        };
        info!(
            fighters = cached.fighters.len(),
            upcoming = cached.upcoming_events.len(),
            "Data loaded from cache"
        );
        self.data.send_replace(Arc::new(cached));
        true
    }

    /// Refresh unless the data is inside the freshness window.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.load_latest(false).await
    }

    /// Refresh regardless of the freshness window.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        self.load_latest(true).await
    }

    /// Enter Loading unless already there. False means a refresh is in flight.
    fn begin_loading(&self) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                false
            } else {
                *state = LoadingState::Loading;
                true
            }
        })
    }

    async fn load_latest(&self, force: bool) -> RefreshOutcome {
        if !self.begin_loading() {
            debug!("Refresh already in flight, ignoring request");
            return RefreshOutcome::Coalesced;
        }

        let fresh = self.data.borrow().is_fresh(Utc::now(), self.freshness_window);
        if !force && fresh {
            info!("Data is up to date, skipping refresh");
            self.state.send_replace(LoadingState::Success);
            return RefreshOutcome::Skipped;
        }

        debug!(force, "Fetching latest data from server");
        let (fighters, events, upcoming) = tokio::join!(
            self.source.fetch_fighters(),
            self.source.fetch_events(),
            self.source.fetch_upcoming_events(),
        );

        let (fighters, events, upcoming) = match (fighters, events, upcoming) {
            (Ok(f), Ok(e), Ok(u)) => (f, e, u),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                if e.is_network() {
                    warn!(error = %e, "Server unreachable, keeping previous data");
                } else {
                    warn!(error = %e, "Refresh failed, keeping previous data");
                }
                self.state.send_replace(LoadingState::Error(e.to_string()));
                return RefreshOutcome::Failed;
            }
        };

        info!(
            fighters = fighters.len(),
            events = events.len(),
            upcoming = upcoming.len(),
            "Fetched latest data"
        );

        let next = transform::build_dataset(fighters, events, upcoming, Utc::now());
        let published = self.publish(next);

        if let Err(e) = self.cache.save_snapshot(&published) {
            warn!(error = %e, "Failed to save snapshot to cache");
        }

        self.state.send_replace(LoadingState::Success);
        RefreshOutcome::Refreshed
    }

    /// Swap in a new dataset in one step, carrying the odds charts over
    /// since they are filled independently of the main refresh.
    fn publish(&self, mut next: Dataset) -> Arc<Dataset> {
        self.data.send_modify(|current| {
            next.odds_charts = current.odds_charts.clone();
            *current = Arc::new(next);
        });
        self.dataset()
    }

    // ===== Odds =====

    /// Fetch odds for both corners of every upcoming bout, one fighter at a
    /// time. Runs once per manager; a failure for one fighter is logged and
    /// the rest continue. Returns how many fighters got a chart.
    pub async fn prefetch_odds(&self) -> usize {
        let names = self.upcoming_fighter_names();
        if names.is_empty() {
            debug!("No upcoming fighters, odds prefetch deferred");
            return 0;
        }
        if self.odds_prefetched.swap(true, Ordering::SeqCst) {
            debug!("Odds already prefetched");
            return 0;
        }

        let total = names.len();
        info!(fighters = total, "Prefetching odds charts");

        let fetched = stream::iter(names)
            .then(|name| async move {
                match self.source.fetch_odds_chart(&name).await {
                    Ok(points) => {
                        let points = filter_allowed(points);
                        debug!(fighter = %name, points = points.len(), "Odds chart fetched");
                        self.store_odds_chart(&name, points);
                        true
                    }
                    Err(e) => {
                        warn!(fighter = %name, error = %e, "Failed to fetch odds chart");
                        false
                    }
                }
            })
            .filter(|ok| std::future::ready(*ok))
            .count()
            .await;

        if let Err(e) = self.cache.save_odds_charts(&self.dataset().odds_charts) {
            warn!(error = %e, "Failed to save odds charts to cache");
        }

        info!(fetched, total, "Odds prefetch finished");
        fetched
    }

    pub fn odds_prefetched(&self) -> bool {
        self.odds_prefetched.load(Ordering::SeqCst)
    }

    fn upcoming_fighter_names(&self) -> Vec<String> {
        let data = self.data.borrow();
        let mut seen = HashSet::new();
        let names: Vec<String> = data
            .upcoming_events
            .iter()
            .flat_map(|card| card.fights.iter())
            .flat_map(|fight| [&fight.red_corner, &fight.blue_corner])
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();
        names
    }

    /// Cached odds for a fighter
    pub fn odds_chart(&self, name: &str) -> Option<Vec<OddsChartPoint>> {
        let data = self.data.borrow();
        transform::lookup_by_name(&data.odds_charts, name).map(|(_, points)| points.clone())
    }

    /// Record odds for a fighter. Last writer wins.
    pub fn store_odds_chart(&self, name: &str, points: Vec<OddsChartPoint>) {
        self.data.send_modify(|data| {
            Arc::make_mut(data)
                .odds_charts
                .insert(name.to_string(), points);
        });
    }

    // ===== Reads =====

    pub fn loading_state(&self) -> LoadingState {
        (*self.state.borrow()).clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LoadingState> {
        self.state.subscribe()
    }

    /// Current dataset. Cheap; the snapshot is shared.
    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.data.borrow())
    }

    pub fn subscribe_dataset(&self) -> watch::Receiver<Arc<Dataset>> {
        self.data.subscribe()
    }

    pub fn fighter(&self, name: &str) -> Option<Fighter> {
        let data = self.data.borrow();
        transform::lookup_by_name(&data.fighters, name).map(|(_, f)| f.clone())
    }

    /// Id 0 means the feed had no id, so it never matches.
    pub fn fighter_by_id(&self, id: i64) -> Option<Fighter> {
        if id == 0 {
            return None;
        }
        self.data
            .borrow()
            .fighters
            .values()
            .find(|f| f.fighter_id == id)
            .cloned()
    }

    pub fn fight_history(&self, name: &str) -> Option<Vec<FightHistoryEntry>> {
        let data = self.data.borrow();
        transform::lookup_by_name(&data.fight_history, name).map(|(_, h)| h.clone())
    }

    pub fn fight_records(&self, name: &str) -> Option<Vec<FightRecord>> {
        transform::fight_records(&self.data.borrow(), name)
    }

    pub fn upcoming_events(&self) -> Vec<EventInfo> {
        self.data.borrow().upcoming_events.clone()
    }

    pub fn past_events(&self) -> Vec<EventInfo> {
        self.data.borrow().past_events.clone()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.data.borrow().last_update
    }

    /// Age of the cached snapshot, e.g. "2h ago"
    pub fn cache_age(&self, now: DateTime<Utc>) -> Option<String> {
        self.cache.age_display(now)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiEvent, ApiFighter, ApiResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Scripted source that counts every request.
    #[derive(Default)]
    struct FakeSource {
        fighters: Vec<ApiFighter>,
        events: Vec<ApiEvent>,
        upcoming: Vec<ApiEvent>,
        odds: HashMap<String, Vec<OddsChartPoint>>,
        fail_events: AtomicBool,
        requests: AtomicUsize,
        odds_requests: Mutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeSource {
        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FightDataSource for FakeSource {
        async fn fetch_fighters(&self) -> ApiResult<Vec<ApiFighter>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(self.fighters.clone())
        }

        async fn fetch_events(&self) -> ApiResult<Vec<ApiEvent>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_events.load(Ordering::SeqCst) {
                return Err(ApiError::ServerUnavailable);
            }
            Ok(self.events.clone())
        }

        async fn fetch_upcoming_events(&self) -> ApiResult<Vec<ApiEvent>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(self.upcoming.clone())
        }

        async fn fetch_odds_chart(&self, fighter: &str) -> ApiResult<Vec<OddsChartPoint>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.odds_requests
                .lock()
                .expect("odds log lock")
                .push(fighter.to_string());
            self.odds
                .get(fighter)
                .cloned()
                .ok_or_else(|| ApiError::InvalidResponse("Status 404 Not Found: ".into()))
        }
    }

    fn api_fighter(name: &str, id: i64) -> ApiFighter {
        serde_json::from_value(serde_json::json!({"Fighter": name, "Wins": 10, "Losses": 2, "Fighter_ID": id}))
            .expect("fighter decodes")
    }

    fn api_bout(event: &str, date: &str, f1: &str, f2: &str, winner: Option<&str>) -> ApiEvent {
        serde_json::from_value(serde_json::json!({
            "Event Name": event,
            "Event Date": date,
            "Fighter 1": f1,
            "Fighter 2": f2,
            "Winning Fighter": winner,
            "Winning Round": 3,
            "Winning Time": "5:00",
        }))
        .expect("event decodes")
    }

    fn point(book: &str, odds: f64) -> OddsChartPoint {
        OddsChartPoint {
            timestamp: "2025-01-01T00:00:00Z".into(),
            odds,
            sportsbook: book.into(),
        }
    }

    fn scripted() -> FakeSource {
        FakeSource {
            fighters: vec![api_fighter("Jon Jones", 123), api_fighter("Stipe Miocic", 55)],
            events: vec![api_bout(
                "UFC 285",
                "2023-03-04T00:00:00+00:00",
                "Jon Jones",
                "Ciryl Gane",
                Some("Jon Jones"),
            )],
            upcoming: vec![api_bout(
                "UFC 309",
                "2024-11-16T00:00:00+00:00",
                "Jon Jones",
                "Stipe Miocic",
                None,
            )],
            ..Default::default()
        }
    }

    fn manager(source: &Arc<FakeSource>, cache: CacheManager) -> Arc<SyncManager> {
        let source: Arc<dyn FightDataSource> = source.clone();
        Arc::new(SyncManager::new(source, cache))
    }

    #[tokio::test]
    async fn test_cold_start_fetches_and_caches() {
        let source = Arc::new(scripted());
        let sync = manager(&source, CacheManager::in_memory());

        match sync.start().await {
            Startup::Fetched(outcome) => assert_eq!(outcome, RefreshOutcome::Refreshed),
            Startup::Hydrated { .. } => panic!("empty cache should not hydrate"),
        }
        assert_eq!(source.requests(), 3);
        assert_eq!(sync.loading_state(), LoadingState::Success);
        assert_eq!(sync.fighter("Jon Jones").map(|f| f.fighter_id), Some(123));
        assert_eq!(sync.upcoming_events().len(), 1);
        assert_eq!(sync.past_events().len(), 1);
        assert!(sync.cache.load_snapshot().is_some());
        assert!(sync.cache_age(Utc::now()).is_some());
    }

    #[tokio::test]
    async fn test_warm_start_hydrates_then_refreshes_in_background() {
        let cache = CacheManager::in_memory();
        let mut cached = transform::build_dataset(
            vec![api_fighter("Cached Fighter", 1)],
            vec![],
            vec![api_bout("UFC 300", "2024-04-13", "A", "B", None)],
            Utc::now() - chrono::Duration::hours(5),
        );
        cached.odds_charts.insert("A".into(), vec![point("fanduel", 100.0)]);
        cache.save_snapshot(&cached).expect("seed cache");

        let source = Arc::new(scripted());
        let sync = manager(&source, cache);

        let Startup::Hydrated { refresh } = sync.start().await else {
            panic!("complete cache should hydrate");
        };
        assert_eq!(refresh.await.expect("refresh task"), RefreshOutcome::Refreshed);

        // Network data replaced the cached fighters; odds carried over
        assert!(sync.fighter("Cached Fighter").is_none());
        assert!(sync.fighter("Jon Jones").is_some());
        assert_eq!(sync.odds_chart("A").map(|p| p.len()), Some(1));
    }

    #[tokio::test]
    async fn test_refresh_skipped_inside_freshness_window() {
        let source = Arc::new(scripted());
        let sync = manager(&source, CacheManager::in_memory());
        assert_eq!(sync.force_refresh().await, RefreshOutcome::Refreshed);
        let before = source.requests();

        assert_eq!(sync.refresh().await, RefreshOutcome::Skipped);
        assert_eq!(source.requests(), before);
        assert_eq!(sync.loading_state(), LoadingState::Success);

        // Forced refresh ignores the window
        assert_eq!(sync.force_refresh().await, RefreshOutcome::Refreshed);
        assert_eq!(source.requests(), before + 3);
    }

    #[tokio::test]
    async fn test_refresh_not_skipped_without_upcoming() {
        let source = Arc::new(FakeSource {
            upcoming: vec![],
            ..scripted()
        });
        let sync = manager(&source, CacheManager::in_memory());
        assert_eq!(sync.force_refresh().await, RefreshOutcome::Refreshed);
        assert_eq!(sync.refresh().await, RefreshOutcome::Refreshed);
        assert_eq!(source.requests(), 6);
    }

    #[tokio::test]
    async fn test_refresh_outside_window_refetches() {
        let source = Arc::new(scripted());
        let sync = Arc::new(
            SyncManager::new(source.clone(), CacheManager::in_memory())
                .with_freshness_window(chrono::Duration::zero()),
        );
        assert_eq!(sync.force_refresh().await, RefreshOutcome::Refreshed);
        assert_eq!(sync.refresh().await, RefreshOutcome::Refreshed);
        assert_eq!(source.requests(), 6);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_data() {
        let source = Arc::new(scripted());
        let sync = manager(&source, CacheManager::in_memory());
        assert_eq!(sync.force_refresh().await, RefreshOutcome::Refreshed);
        let before = sync.dataset();

        source.fail_events.store(true, Ordering::SeqCst);
        assert_eq!(sync.force_refresh().await, RefreshOutcome::Failed);

        assert!(matches!(sync.loading_state(), LoadingState::Error(msg) if msg.contains("unavailable")));
        assert!(Arc::ptr_eq(&before, &sync.dataset()));
        assert!(sync.fighter("Jon Jones").is_some());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_coalesced() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(FakeSource {
            gate: Some(gate.clone()),
            ..scripted()
        });
        let sync = manager(&source, CacheManager::in_memory());

        let mut states = sync.subscribe_state();
        let first = tokio::spawn({
            let sync = Arc::clone(&sync);
            async move { sync.force_refresh().await }
        });
        states
            .wait_for(LoadingState::is_loading)
            .await
            .expect("state channel open");

        assert_eq!(sync.force_refresh().await, RefreshOutcome::Coalesced);
        assert_eq!(sync.refresh().await, RefreshOutcome::Coalesced);

        gate.notify_one();
        assert_eq!(first.await.expect("refresh task"), RefreshOutcome::Refreshed);
        assert_eq!(source.requests(), 3);
    }

    #[tokio::test]
    async fn test_dataset_subscribers_see_replacement() {
        let source = Arc::new(scripted());
        let sync = manager(&source, CacheManager::in_memory());
        let mut rx = sync.subscribe_dataset();
        assert!(rx.borrow_and_update().is_empty());

        sync.force_refresh().await;
        assert!(rx.has_changed().expect("channel open"));
        assert_eq!(rx.borrow_and_update().fighters.len(), 2);
    }

    #[tokio::test]
    async fn test_prefetch_odds_runs_once_and_filters_books() {
        let mut odds = HashMap::new();
        odds.insert(
            "Jon Jones".to_string(),
            vec![point("draftkings", -250.0), point("shady-book", -900.0)],
        );
        let source = Arc::new(FakeSource { odds, ..scripted() });
        let sync = manager(&source, CacheManager::in_memory());

        // Nothing upcoming yet: latch stays open
        assert_eq!(sync.prefetch_odds().await, 0);
        assert!(!sync.odds_prefetched());

        sync.force_refresh().await;
        // Stipe has no odds upstream; that failure does not stop Jon's
        assert_eq!(sync.prefetch_odds().await, 1);
        assert!(sync.odds_prefetched());
        assert_eq!(
            *source.odds_requests.lock().expect("odds log lock"),
            vec!["Jon Jones".to_string(), "Stipe Miocic".to_string()]
        );

        let jones = sync.odds_chart("jon jones").expect("odds cached");
        assert_eq!(jones.len(), 1);
        assert_eq!(jones[0].sportsbook, "draftkings");
        assert!(sync.odds_chart("Stipe Miocic").is_none());

        // Second pass is a no-op
        let before = source.requests();
        assert_eq!(sync.prefetch_odds().await, 0);
        assert_eq!(source.requests(), before);

        // Persisted alongside the snapshot
        let cached = sync.cache.load_snapshot().expect("snapshot");
        assert_eq!(cached.odds_charts.get("Jon Jones").map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_fighter_by_id_ignores_missing_ids() {
        let mut scripted = scripted();
        scripted.fighters.push(api_fighter("Ciryl Gane", 0));
        let sync = manager(&Arc::new(scripted), CacheManager::in_memory());
        sync.force_refresh().await;

        assert!(sync.fighter("Ciryl Gane").is_some());
        assert!(sync.fighter_by_id(0).is_none());
        assert_eq!(sync.fighter_by_id(123).map(|f| f.name), Some("Jon Jones".into()));
    }

    #[tokio::test]
    async fn test_store_odds_chart_last_writer_wins() {
        let sync = manager(&Arc::new(scripted()), CacheManager::in_memory());
        sync.store_odds_chart("Jon Jones", vec![point("bovada", 1.0)]);
        sync.store_odds_chart("Jon Jones", vec![point("fanduel", 2.0), point("bovada", 3.0)]);
        assert_eq!(sync.odds_chart("Jon Jones").map(|p| p.len()), Some(2));
    }

    #[tokio::test]
    async fn test_lookups() {
        let source = Arc::new(scripted());
        let sync = manager(&source, CacheManager::in_memory());
        sync.force_refresh().await;

        assert_eq!(sync.fighter("JonJones").map(|f| f.name), Some("Jon Jones".into()));
        assert_eq!(sync.fighter_by_id(55).map(|f| f.name), Some("Stipe Miocic".into()));
        assert!(sync.fighter_by_id(999).is_none());

        let history = sync.fight_history("Ciryl Gane").expect("history");
        assert_eq!(history[0].opponent, "Jon Jones");
        assert_eq!(history[0].opponent_id, 123);

        let records = sync.fight_records("jon jones").expect("records");
        assert_eq!(records[0].round, Some(3));
        assert_eq!(records[0].time.as_deref(), Some("5:00"));

        // Upcoming bouts get ids from the same fighter batch
        let upcoming = sync.upcoming_events();
        assert_eq!(upcoming[0].fights[0].blue_corner_id, 55);
    }
}
