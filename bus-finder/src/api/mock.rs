//! In-memory bus backend for tests and offline development.
//!
//! Responses are registered up front and can be swapped at any time.
//! Per-request delays make it possible to stage responses that resolve
//! out of order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::domain::{AddressMatches, ArrivalBoard, Coordinate, NearbyStations};

use super::error::ApiError;
use super::gateway::{BoardSource, BusApi};

/// Identifies one mocked response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MockKey {
    Board(BoardSource),
    /// Trimmed address query.
    Addresses(String),
    /// Search center, as rendered by `Coordinate`'s `Display`.
    Stations(String),
}

impl MockKey {
    pub fn addresses(query: &str) -> Self {
        MockKey::Addresses(query.trim().to_string())
    }

    pub fn stations(center: Coordinate) -> Self {
        MockKey::Stations(center.to_string())
    }
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Arrivals(BoardSource),
    SearchAddresses { query: String, limit: usize },
    NearbyStations { center: Coordinate, radius: u32 },
}

#[derive(Default)]
struct MockState {
    boards: HashMap<BoardSource, ArrivalBoard>,
    addresses: HashMap<String, AddressMatches>,
    stations: HashMap<String, NearbyStations>,
    delays: HashMap<MockKey, Duration>,
    default_delay: Duration,
    failure: Option<(u16, String)>,
    calls: Vec<MockCall>,
}

/// Mock bus backend.
///
/// Unknown boards answer 404; unknown address queries and station centers
/// answer with an empty result.
#[derive(Clone, Default)]
pub struct MockBusApi {
    state: Arc<Mutex<MockState>>,
}

impl MockBusApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `board` for its station.
    pub async fn insert_board(&self, board: ArrivalBoard) {
        let source = BoardSource::Station(board.station_id);
        self.state.lock().await.boards.insert(source, board);
    }

    /// Serve `board` as the backend's default board.
    pub async fn insert_default_board(&self, board: ArrivalBoard) {
        self.state
            .lock()
            .await
            .boards
            .insert(BoardSource::Default, board);
    }

    /// Serve `matches` for `query`.
    pub async fn insert_addresses(&self, query: &str, matches: AddressMatches) {
        self.state
            .lock()
            .await
            .addresses
            .insert(query.trim().to_string(), matches);
    }

    /// Serve `stations` for searches centered on `center`.
    pub async fn insert_stations(&self, center: Coordinate, stations: NearbyStations) {
        self.state
            .lock()
            .await
            .stations
            .insert(center.to_string(), stations);
    }

    /// Delay responses for one key.
    pub async fn set_delay(&self, key: MockKey, delay: Duration) {
        self.state.lock().await.delays.insert(key, delay);
    }

    /// Delay every response without a per-key delay.
    pub async fn set_default_delay(&self, delay: Duration) {
        self.state.lock().await.default_delay = delay;
    }

    /// Fail every request with the given status and detail message.
    pub async fn set_failure(&self, status: u16, message: impl Into<String>) {
        self.state.lock().await.failure = Some((status, message.into()));
    }

    pub async fn clear_failure(&self) {
        self.state.lock().await.failure = None;
    }

    /// Requests received so far, in order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Record the call and wait out its delay. Returns the configured
    /// failure, if any.
    async fn begin(&self, call: MockCall, key: MockKey) -> Result<(), ApiError> {
        let delay = {
            let mut state = self.state.lock().await;
            state.calls.push(call);
            state
                .delays
                .get(&key)
                .copied()
                .unwrap_or(state.default_delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.state.lock().await.failure.clone() {
            Some((status, message)) => Err(ApiError::Api { status, message }),
            None => Ok(()),
        }
    }
}

impl BusApi for MockBusApi {
    async fn arrivals(&self, source: BoardSource) -> Result<ArrivalBoard, ApiError> {
        self.begin(MockCall::Arrivals(source), MockKey::Board(source))
            .await?;

        let state = self.state.lock().await;
        state
            .boards
            .get(&source)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Station not found".to_string(),
            })
    }

    async fn search_addresses(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<AddressMatches, ApiError> {
        let call = MockCall::SearchAddresses {
            query: query.to_string(),
            limit,
        };
        self.begin(call, MockKey::addresses(query)).await?;

        let state = self.state.lock().await;
        let mut matches = state
            .addresses
            .get(query.trim())
            .cloned()
            .unwrap_or_else(|| AddressMatches {
                addresses: Vec::new(),
                query: query.to_string(),
            });
        matches.addresses.truncate(limit);
        Ok(matches)
    }

    async fn nearby_stations(
        &self,
        center: Coordinate,
        radius: u32,
    ) -> Result<NearbyStations, ApiError> {
        self.begin(
            MockCall::NearbyStations { center, radius },
            MockKey::stations(center),
        )
        .await?;

        let state = self.state.lock().await;
        Ok(state
            .stations
            .get(&center.to_string())
            .cloned()
            .unwrap_or_else(|| NearbyStations {
                stations: Vec::new(),
                center,
                radius,
                total_stations: 0,
            }))
    }
}
