//! Live arrivals for the selected board.
//!
//! Selecting a board fetches it at once and then on a fixed interval until
//! another board is selected or the feed is stopped. Every fetch, polled
//! or manual, is tagged with its own generation so a slow answer never
//! overwrites a newer one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{BoardSource, BusApi};
use crate::domain::ArrivalBoard;
use crate::error::NetworkError;
use crate::generation::{Generation, GenerationGate};
use crate::task::ScopedTask;

const FETCH_FAILED: &str = "Failed to fetch bus data";

/// Snapshot of the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedView {
    pub source: Option<BoardSource>,
    pub board: Option<ArrivalBoard>,
    pub loading: bool,
    pub error: Option<NetworkError>,
}

#[derive(Default)]
struct Inner {
    source: Option<BoardSource>,
    gate: GenerationGate,
    board: Option<ArrivalBoard>,
    error: Option<NetworkError>,
}

struct Shared<A> {
    api: Arc<A>,
    inner: Mutex<Inner>,
    view: watch::Sender<FeedView>,
}

/// Polling arrivals feed for one board at a time.
pub struct LiveArrivalsFeed<A> {
    shared: Arc<Shared<A>>,
    interval: Duration,
    poller: Mutex<Option<ScopedTask>>,
}

impl<A: BusApi> LiveArrivalsFeed<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        let (view, _) = watch::channel(FeedView::default());
        Self {
            shared: Arc::new(Shared {
                api,
                inner: Mutex::new(Inner::default()),
                view,
            }),
            interval,
            poller: Mutex::new(None),
        }
    }

    pub fn view(&self) -> FeedView {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.shared.view.subscribe()
    }

    /// Wait until no fetch is outstanding and return the view.
    pub async fn settled(&self) -> FeedView {
        let mut rx = self.subscribe();
        match rx.wait_for(|v| !v.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        }
    }

    /// Watch `source`, replacing whatever was watched before.
    ///
    /// Re-selecting the board already watched changes nothing.
    pub async fn select(&self, source: BoardSource) {
        let mut poller = self.poller.lock().await;
        let mut inner = self.shared.inner.lock().await;
        if inner.source == Some(source) && poller.is_some() {
            return;
        }

        info!(%source, "watching board");
        inner.source = Some(source);
        inner.gate.invalidate();
        inner.board = None;
        inner.error = None;
        self.shared.launch(&mut inner, source);
        drop(inner);

        *poller = Some(self.spawn_poller(source));
    }

    /// Fetch now, outside the polling schedule.
    pub async fn refetch(&self) {
        let mut inner = self.shared.inner.lock().await;
        if let Some(source) = inner.source {
            self.shared.launch(&mut inner, source);
        }
    }

    /// Stop polling and forget the board.
    pub async fn stop(&self) {
        let mut poller = self.poller.lock().await;
        *poller = None;

        let mut inner = self.shared.inner.lock().await;
        if let Some(source) = inner.source.take() {
            debug!(%source, "feed stopped");
        }
        inner.gate.invalidate();
        inner.board = None;
        inner.error = None;
        self.shared.publish(&inner);
    }

    fn spawn_poller(&self, source: BoardSource) -> ScopedTask {
        let shared = Arc::clone(&self.shared);
        let period = self.interval;

        ScopedTask::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let mut inner = shared.inner.lock().await;
                if inner.source != Some(source) {
                    break;
                }
                shared.launch(&mut inner, source);
            }
        })
    }
}

impl<A: BusApi> Shared<A> {
    fn publish(&self, inner: &Inner) {
        self.view.send_replace(FeedView {
            source: inner.source,
            board: inner.board.clone(),
            loading: inner.gate.has_pending(),
            error: inner.error.clone(),
        });
    }

    /// Issue a fetch under a fresh generation.
    fn launch(self: &Arc<Self>, inner: &mut Inner, source: BoardSource) {
        let generation = inner.gate.issue();
        self.publish(inner);

        debug!(generation = generation.get(), %source, "board fetch issued");
        tokio::spawn(Arc::clone(self).fetch(generation, source));
    }

    async fn fetch(self: Arc<Self>, generation: Generation, source: BoardSource) {
        let result = self.api.arrivals(source).await;

        let mut inner = self.inner.lock().await;
        if !inner.gate.accept(generation) {
            debug!(generation = generation.get(), %source, "discarding stale board");
            return;
        }

        match result {
            Ok(board) => {
                debug!(%source, arrivals = board.arrivals.len(), "board updated");
                inner.board = Some(board);
                inner.error = None;
            }
            Err(e) => {
                warn!(%source, error = %e, "board fetch failed");
                inner.board = None;
                inner.error = Some(e.to_network_error(FETCH_FAILED));
            }
        }
        self.publish(&inner);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::api::{MockBusApi, MockCall, MockKey};
    use crate::domain::{BusArrival, StationKey};

    const PERIOD: Duration = Duration::from_secs(30);

    fn key(n: u64) -> StationKey {
        StationKey::new(n).unwrap()
    }

    fn board(id: u64, line: &str) -> ArrivalBoard {
        ArrivalBoard {
            station_id: key(id),
            arrivals: vec![BusArrival::new(line, "Dan", "Central", "", vec![3, 14]).unwrap()],
            last_updated: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            total_count: 1,
        }
    }

    fn line(view: &FeedView) -> Option<&str> {
        view.board
            .as_ref()
            .map(|b| b.arrivals[0].line_number.as_str())
    }

    async fn setup() -> (Arc<MockBusApi>, LiveArrivalsFeed<MockBusApi>) {
        let api = Arc::new(MockBusApi::new());
        api.insert_board(board(1, "18")).await;
        api.insert_board(board(2, "61")).await;
        let feed = LiveArrivalsFeed::new(Arc::clone(&api), PERIOD);
        (api, feed)
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_polls() {
        let (api, feed) = setup().await;

        feed.select(BoardSource::Station(key(1))).await;
        assert!(feed.view().loading);
        let view = feed.settled().await;
        assert_eq!(line(&view), Some("18"));
        assert_eq!(api.call_count().await, 1);

        tokio::time::sleep(PERIOD + Duration::from_millis(100)).await;
        assert_eq!(api.call_count().await, 2);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(api.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_keeps_interval_schedule() {
        let (api, feed) = setup().await;
        feed.select(BoardSource::Station(key(1))).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        feed.refetch().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.call_count().await, 2);

        // The scheduled tick still fires at 30 s, not 40 s
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn changing_station_restarts_interval() {
        let (api, feed) = setup().await;
        let a = BoardSource::Station(key(1));
        let b = BoardSource::Station(key(2));

        feed.select(a).await;
        tokio::time::sleep(Duration::from_secs(20)).await;
        feed.select(b).await;

        // A's 30 s tick is gone; B's first poll is at 50 s
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(
            api.calls().await,
            [MockCall::Arrivals(a), MockCall::Arrivals(b)]
        );

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(api.calls().await.last(), Some(&MockCall::Arrivals(b)));
        assert_eq!(api.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_for_previous_station_discarded() {
        let (api, feed) = setup().await;
        let a = BoardSource::Station(key(1));
        let b = BoardSource::Station(key(2));
        api.set_delay(MockKey::Board(a), Duration::from_secs(5))
            .await;

        feed.select(a).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        feed.select(b).await;

        let view = feed.settled().await;
        assert_eq!(view.source, Some(b));
        assert_eq!(line(&view), Some("61"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(line(&feed.view()), Some("61"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_poll_does_not_overwrite_newer_refetch() {
        let (api, feed) = setup().await;
        let a = BoardSource::Station(key(1));
        feed.select(a).await;
        feed.settled().await;

        // Poll at 30 s is slow; a refetch right after it answers first
        api.set_delay(MockKey::Board(a), Duration::from_secs(4))
            .await;
        tokio::time::sleep(PERIOD + Duration::from_millis(100)).await;
        api.set_delay(MockKey::Board(a), Duration::ZERO).await;
        api.insert_board(board(1, "18A")).await;
        feed.refetch().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(line(&feed.view()), Some("18A"));

        // The poll's answer (issued earlier) arrives later and is dropped
        api.insert_board(board(1, "18B")).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(line(&feed.view()), Some("18A"));
        assert_eq!(api.call_count().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn error_reported_and_recovers() {
        let (api, feed) = setup().await;
        api.set_failure(502, "Upstream feed unavailable").await;

        feed.select(BoardSource::Station(key(1))).await;
        let view = feed.settled().await;
        assert_eq!(view.board, None);
        assert_eq!(
            view.error,
            Some(NetworkError::new("Upstream feed unavailable", Some(502)))
        );

        api.clear_failure().await;
        feed.refetch().await;
        let view = feed.settled().await;
        assert_eq!(view.error, None);
        assert_eq!(line(&view), Some("18"));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_station_uses_backend_detail() {
        let (_api, feed) = setup().await;
        feed.select(BoardSource::Station(key(99))).await;

        let view = feed.settled().await;
        assert_eq!(view.error.map(|e| e.message).as_deref(), Some("Station not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn default_board() {
        let (api, feed) = setup().await;
        api.insert_default_board(board(21472, "5")).await;

        feed.select(BoardSource::Default).await;
        let view = feed.settled().await;
        assert_eq!(view.board.map(|b| b.station_id), Some(key(21472)));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_and_drop_end_polling() {
        let (api, feed) = setup().await;
        feed.select(BoardSource::Station(key(1))).await;
        feed.settled().await;

        feed.stop().await;
        assert_eq!(feed.view(), FeedView::default());
        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(api.call_count().await, 1);

        feed.select(BoardSource::Station(key(2))).await;
        feed.settled().await;
        drop(feed);
        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(api.call_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reselecting_same_station_is_noop() {
        let (api, feed) = setup().await;
        let a = BoardSource::Station(key(1));

        feed.select(a).await;
        feed.settled().await;
        feed.select(a).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(api.call_count().await, 1);
    }
}
