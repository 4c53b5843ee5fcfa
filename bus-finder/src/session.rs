//! Session orchestration.
//!
//! [`Session`] owns the navigation state and is the only thing that
//! mutates it. Committed results from the other components (an address,
//! a device fix, a station) come in through its methods; it then points
//! station discovery and the arrivals feed at whatever the new state
//! requires.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::info;

use crate::api::{BoardSource, BusApi};
use crate::config::SessionConfig;
use crate::discovery::StationDiscovery;
use crate::domain::{Address, Coordinate, Station, StationKey};
use crate::feed::LiveArrivalsFeed;
use crate::location::{AcquisitionOutcome, GeolocationAcquisition};
use crate::navigation::{NavigationError, SearchSession, Step};

/// One user's search session.
pub struct Session<A> {
    navigation: Mutex<SearchSession>,
    snapshot: watch::Sender<SearchSession>,
    discovery: StationDiscovery<A>,
    feed: LiveArrivalsFeed<A>,
}

impl<A: BusApi> Session<A> {
    pub fn new(api: Arc<A>, config: &SessionConfig) -> Self {
        let (snapshot, _) = watch::channel(SearchSession::new());
        Self {
            navigation: Mutex::new(SearchSession::new()),
            snapshot,
            discovery: StationDiscovery::new(Arc::clone(&api), config.station_radius),
            feed: LiveArrivalsFeed::new(api, config.refresh_interval),
        }
    }

    pub fn navigation(&self) -> SearchSession {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSession> {
        self.snapshot.subscribe()
    }

    pub fn discovery(&self) -> &StationDiscovery<A> {
        &self.discovery
    }

    pub fn feed(&self) -> &LiveArrivalsFeed<A> {
        &self.feed
    }

    /// An address was committed in the autocomplete box.
    pub async fn select_address(&self, address: Address) -> Result<(), NavigationError> {
        let mut nav = self.navigation.lock().await;
        nav.select_address(address)?;
        self.resolved(&nav).await;
        Ok(())
    }

    /// The device reported a position.
    pub async fn location_resolved(&self, coordinate: Coordinate) {
        let mut nav = self.navigation.lock().await;
        nav.location_resolved(coordinate);
        self.resolved(&nav).await;
    }

    /// Run a location request and, on success, resolve the session with it.
    ///
    /// The fix is handed over at most once per request lifecycle.
    pub async fn locate_with(&self, geolocation: &GeolocationAcquisition) -> AcquisitionOutcome {
        let outcome = geolocation.request_location().await;
        if let AcquisitionOutcome::Found(_) = outcome {
            if let Some(coordinate) = geolocation.take_delivery().await {
                self.location_resolved(coordinate).await;
            }
        }
        outcome
    }

    /// Pick a station and start watching its arrivals.
    pub async fn select_station(&self, station: Station) -> Result<(), NavigationError> {
        let key = station.key;
        let mut nav = self.navigation.lock().await;
        nav.select_station(station)?;
        self.snapshot.send_replace(nav.clone());

        self.feed.select(BoardSource::Station(key)).await;
        Ok(())
    }

    /// Pick a station from the current discovery result by key.
    pub async fn select_station_key(&self, key: StationKey) -> Result<(), NavigationError> {
        let station = self
            .discovery
            .view()
            .stations
            .and_then(|nearby| nearby.get(key).cloned())
            .ok_or(NavigationError::UnknownStation(key))?;

        self.select_station(station).await
    }

    /// Step back one screen.
    pub async fn go_back(&self) -> Step {
        let mut nav = self.navigation.lock().await;
        let step = nav.go_back();
        self.snapshot.send_replace(nav.clone());

        self.feed.stop().await;
        if step == Step::Searching {
            self.discovery.set_center(None).await;
        }
        step
    }

    pub async fn refetch_stations(&self) {
        self.discovery.refetch().await;
    }

    pub async fn refetch_arrivals(&self) {
        self.feed.refetch().await;
    }

    /// A new coordinate was resolved: drop the old board and look for
    /// stations around the new point.
    async fn resolved(&self, nav: &SearchSession) {
        self.snapshot.send_replace(nav.clone());
        info!(
            method = ?nav.resolution_method(),
            coordinate = ?nav.coordinate(),
            "location resolved"
        );

        self.feed.stop().await;
        self.discovery.set_center(nav.coordinate()).await;
    }
}
