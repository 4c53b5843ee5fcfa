//! Backend response DTOs.
//!
//! These map directly to the JSON the bus backend returns. Field names
//! follow the wire format, including the PascalCase station records the
//! backend passes through from the upstream stop registry.

use serde::Deserialize;

/// Response from `GET /api/buses` and `GET /api/buses/{station_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BusStationResponse {
    pub station_id: u64,
    pub buses: Vec<SimpleBusInfo>,
    /// ISO 8601 timestamp, with or without an offset.
    pub last_updated: String,
    pub total_buses: usize,
}

/// One line's arrivals in a station response.
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleBusInfo {
    pub bus_number: String,
    pub company_name: String,
    pub destination: String,
    #[serde(default)]
    pub arrival_times: Vec<u32>,
    #[serde(default)]
    pub description: String,
    pub next_arrival_minutes: u32,
}

/// Response from `GET /api/address/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressSearchResponse {
    pub addresses: Vec<AddressDto>,
    pub query: String,
}

/// An address candidate. Coordinates are decimal strings.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressDto {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    /// Geocoder place ID; numeric or string depending on the geocoder.
    #[serde(default)]
    pub place_id: Option<serde_json::Value>,
    #[serde(default)]
    pub importance: Option<f64>,
}

/// Response from `GET /api/stations/nearby`.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyStationsResponse {
    pub stations: Vec<BusStopDto>,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius: u32,
    pub total_stations: usize,
}

/// A stop record from the stop registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusStopDto {
    pub name: String,
    #[serde(default)]
    pub english_name: Option<String>,
    /// Station key.
    pub makat: u64,
    pub longitude: f64,
    pub latitude: f64,
    /// Distance from the search center in meters.
    pub distance: f64,
    /// Served lines; entries carry `LineNumber` or `Shilut`.
    #[serde(default)]
    pub line_list: Option<Vec<serde_json::Value>>,
}

/// Error body shape used by the backend (`{"detail": ...}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}
