//! Nearby-station discovery for the resolved coordinate.
//!
//! A fetch is issued whenever the center or radius changes. Results are
//! never cached: moving away from a point and back fetches again. Each
//! fetch carries a generation and a response for a superseded center is
//! dropped.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::api::BusApi;
use crate::domain::{Coordinate, NearbyStations};
use crate::error::NetworkError;
use crate::generation::{Generation, GenerationGate};

const FETCH_FAILED: &str = "Failed to fetch nearby stations";

/// Snapshot of the discovery state.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryView {
    pub center: Option<Coordinate>,
    pub radius: u32,
    pub stations: Option<NearbyStations>,
    pub loading: bool,
    pub error: Option<NetworkError>,
}

struct Inner {
    center: Option<Coordinate>,
    radius: u32,
    gate: GenerationGate,
    stations: Option<NearbyStations>,
    error: Option<NetworkError>,
}

struct Shared<A> {
    api: Arc<A>,
    inner: Mutex<Inner>,
    view: watch::Sender<DiscoveryView>,
}

/// Fetches stations around the current center.
pub struct StationDiscovery<A> {
    shared: Arc<Shared<A>>,
}

impl<A: BusApi> StationDiscovery<A> {
    pub fn new(api: Arc<A>, radius: u32) -> Self {
        let inner = Inner {
            center: None,
            radius,
            gate: GenerationGate::default(),
            stations: None,
            error: None,
        };
        let (view, _) = watch::channel(inner.view());

        Self {
            shared: Arc::new(Shared {
                api,
                inner: Mutex::new(inner),
                view,
            }),
        }
    }

    pub fn view(&self) -> DiscoveryView {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoveryView> {
        self.shared.view.subscribe()
    }

    /// Wait until no fetch is outstanding and return the view.
    pub async fn settled(&self) -> DiscoveryView {
        let mut rx = self.subscribe();
        match rx.wait_for(|v| !v.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        }
    }

    /// Move the search center. `None` clears the results without a request.
    pub async fn set_center(&self, center: Option<Coordinate>) {
        let mut inner = self.shared.inner.lock().await;
        if inner.center == center {
            return;
        }

        inner.center = center;
        inner.gate.invalidate();
        inner.stations = None;
        inner.error = None;
        self.start(inner);
    }

    pub async fn set_radius(&self, radius: u32) {
        let mut inner = self.shared.inner.lock().await;
        if inner.radius == radius {
            return;
        }

        inner.radius = radius;
        inner.gate.invalidate();
        inner.stations = None;
        inner.error = None;
        self.start(inner);
    }

    /// Fetch again for the current center, keeping what is shown until
    /// the new result lands.
    pub async fn refetch(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.gate.invalidate();
        self.start(inner);
    }

    /// Issue a fetch for the current center, if any, and publish.
    fn start(&self, mut inner: tokio::sync::MutexGuard<'_, Inner>) {
        let Some(center) = inner.center else {
            self.shared.view.send_replace(inner.view());
            return;
        };

        let generation = inner.gate.issue();
        let radius = inner.radius;
        self.shared.view.send_replace(inner.view());
        drop(inner);

        debug!(generation = generation.get(), %center, radius, "station fetch issued");
        tokio::spawn(Arc::clone(&self.shared).fetch(generation, center, radius));
    }
}

impl<A: BusApi> Shared<A> {
    async fn fetch(self: Arc<Self>, generation: Generation, center: Coordinate, radius: u32) {
        let result = self.api.nearby_stations(center, radius).await;

        let mut inner = self.inner.lock().await;
        if !inner.gate.accept(generation) {
            debug!(generation = generation.get(), %center, "discarding stale stations");
            return;
        }

        match result {
            Ok(nearby) => {
                info!(%center, count = nearby.stations.len(), "stations found");
                inner.stations = Some(nearby);
                inner.error = None;
            }
            Err(e) => {
                warn!(%center, error = %e, "station fetch failed");
                inner.stations = None;
                inner.error = Some(e.to_network_error(FETCH_FAILED));
            }
        }
        self.view.send_replace(inner.view());
    }
}

impl Inner {
    fn view(&self) -> DiscoveryView {
        DiscoveryView {
            center: self.center,
            radius: self.radius,
            stations: self.stations.clone(),
            loading: self.gate.has_pending(),
            error: self.error.clone(),
        }
    }
}
