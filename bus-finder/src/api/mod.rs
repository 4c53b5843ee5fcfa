//! Bus backend gateway.
//!
//! Three read-only endpoints:
//! - `GET /api/buses/{station_id}` (or `/api/buses` for the default
//!   station): live arrivals
//! - `GET /api/address/search?q=&limit=`: address candidates
//! - `GET /api/stations/nearby?lat=&lng=&radius=`: stations around a point
//!
//! Responses are never cached. Stale results are the caller's concern;
//! see [`crate::generation`].

mod client;
mod convert;
mod error;
mod gateway;
mod mock;
mod types;

pub use client::{ApiConfig, BusApiClient, DEFAULT_BASE_URL};
pub use convert::{ConversionError, error_detail};
pub use error::ApiError;
pub use gateway::{BoardSource, BusApi};
pub use mock::{MockBusApi, MockCall, MockKey};
pub use types::{
    AddressDto, AddressSearchResponse, BusStationResponse, BusStopDto, NearbyStationsResponse,
    SimpleBusInfo,
};
