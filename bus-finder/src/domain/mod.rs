//! Domain types for the bus finder.
//!
//! These are validated values the rest of the crate works with. Wire
//! formats live in `api`; everything here is independent of the backend's
//! JSON shape.

mod address;
mod arrival;
mod coordinate;
mod format;
mod station;

pub use address::{Address, AddressMatches};
pub use arrival::{
    ArrivalBoard, ArrivalSort, BoardQuery, BusArrival, UPCOMING_SHOWN, Urgency, compare_lines,
};
pub use coordinate::{Coordinate, InvalidCoordinate};
pub use format::{format_arrival, format_distance, format_last_updated};
pub use station::{InvalidStationKey, LINE_PREVIEW_LEN, NearbyStations, Station, StationKey};
