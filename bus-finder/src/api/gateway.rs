//! The backend operations the session depends on.

use std::fmt;
use std::future::Future;

use crate::domain::{AddressMatches, ArrivalBoard, Coordinate, NearbyStations, StationKey};

use super::error::ApiError;

/// Which arrivals board to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardSource {
    /// A specific station.
    Station(StationKey),
    /// The backend's configured default station.
    Default,
}

impl fmt::Display for BoardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardSource::Station(key) => write!(f, "station {key}"),
            BoardSource::Default => f.write_str("default station"),
        }
    }
}

/// Bus backend operations.
///
/// Implemented by [`BusApiClient`](super::BusApiClient) over HTTP and by
/// [`MockBusApi`](super::MockBusApi) for tests. Calls are independent and
/// may overlap; nothing is cached between them.
pub trait BusApi: Send + Sync + 'static {
    /// Live arrivals for a board.
    fn arrivals(
        &self,
        source: BoardSource,
    ) -> impl Future<Output = Result<ArrivalBoard, ApiError>> + Send;

    /// Ranked address candidates for a free-text query.
    fn search_addresses(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<AddressMatches, ApiError>> + Send;

    /// Stations within `radius` meters of `center`.
    fn nearby_stations(
        &self,
        center: Coordinate,
        radius: u32,
    ) -> impl Future<Output = Result<NearbyStations, ApiError>> + Send;
}
