//! Conversion from backend DTOs to domain types.
//!
//! Malformed entries inside a list (a stop with an out-of-range position,
//! a line with no arrivals) are logged and skipped rather than failing the
//! whole response.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use tracing::warn;

use crate::domain::{
    Address, AddressMatches, ArrivalBoard, BusArrival, Coordinate, NearbyStations, Station,
    StationKey,
};

use super::types::{
    AddressDto, AddressSearchResponse, BusStationResponse, BusStopDto, ErrorBody,
    NearbyStationsResponse, SimpleBusInfo,
};

/// Longest error body echoed back verbatim.
const MAX_ERROR_BODY: usize = 500;

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Station key was zero or otherwise unusable
    #[error("invalid station key: {0}")]
    InvalidStationKey(u64),

    /// Coordinate out of range
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Timestamp in an unrecognised format
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Convert an arrivals response to a board.
pub fn convert_board(response: BusStationResponse) -> Result<ArrivalBoard, ConversionError> {
    let station_id = StationKey::new(response.station_id)
        .map_err(|_| ConversionError::InvalidStationKey(response.station_id))?;
    let last_updated = parse_timestamp(&response.last_updated)?;

    let arrivals = response
        .buses
        .into_iter()
        .filter_map(|bus| {
            let line = bus.bus_number.clone();
            let converted = convert_bus(bus);
            if converted.is_none() {
                warn!(%station_id, %line, "skipping line with no arrivals");
            }
            converted
        })
        .collect();

    Ok(ArrivalBoard {
        station_id,
        arrivals,
        last_updated,
        total_count: response.total_buses,
    })
}

fn convert_bus(bus: SimpleBusInfo) -> Option<BusArrival> {
    // Older backends only send the nearest arrival
    let times = if bus.arrival_times.is_empty() {
        vec![bus.next_arrival_minutes]
    } else {
        bus.arrival_times
    };

    BusArrival::new(
        bus.bus_number,
        bus.company_name,
        bus.destination,
        bus.description,
        times,
    )
}

/// Convert an address search response, preserving rank order.
pub fn convert_addresses(response: AddressSearchResponse) -> AddressMatches {
    AddressMatches {
        addresses: response.addresses.into_iter().map(convert_address).collect(),
        query: response.query,
    }
}

fn convert_address(dto: AddressDto) -> Address {
    let place_id = dto.place_id.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Address {
        display_name: dto.display_name,
        lat: dto.lat,
        lon: dto.lon,
        place_id,
        importance: dto.importance,
    }
}

/// Convert a nearby-stations response.
///
/// Stations are de-duplicated by key, keeping the first occurrence.
pub fn convert_stations(
    response: NearbyStationsResponse,
) -> Result<NearbyStations, ConversionError> {
    let center = Coordinate::new(response.center_lat, response.center_lng).map_err(|_| {
        ConversionError::InvalidCoordinate(format!(
            "{},{}",
            response.center_lat, response.center_lng
        ))
    })?;

    let mut seen = HashSet::new();
    let mut stations = Vec::with_capacity(response.stations.len());

    for stop in response.stations {
        match convert_stop(stop) {
            Ok(station) => {
                if seen.insert(station.key) {
                    stations.push(station);
                } else {
                    warn!(key = %station.key, "dropping duplicate station");
                }
            }
            Err(e) => warn!(error = %e, "skipping station"),
        }
    }

    Ok(NearbyStations {
        stations,
        center,
        radius: response.radius,
        total_stations: response.total_stations,
    })
}

fn convert_stop(stop: BusStopDto) -> Result<Station, ConversionError> {
    let key =
        StationKey::new(stop.makat).map_err(|_| ConversionError::InvalidStationKey(stop.makat))?;
    let location = Coordinate::new(stop.latitude, stop.longitude).map_err(|_| {
        ConversionError::InvalidCoordinate(format!("{},{}", stop.latitude, stop.longitude))
    })?;

    let lines = stop
        .line_list
        .unwrap_or_default()
        .iter()
        .filter_map(line_identifier)
        .collect();

    Ok(Station {
        name: stop.name,
        english_name: stop.english_name.filter(|n| !n.trim().is_empty()),
        key,
        location,
        distance_meters: stop.distance,
        lines,
    })
}

/// Extract a line's public identifier from a `LineList` entry.
fn line_identifier(entry: &serde_json::Value) -> Option<String> {
    ["LineNumber", "Shilut"]
        .iter()
        .filter_map(|field| entry.get(field))
        .find_map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Parse a backend timestamp: RFC 3339, or a naive ISO 8601 local time.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, ConversionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| ConversionError::InvalidTimestamp(s.to_string()))
}

/// User-facing message from an error response body.
///
/// Prefers the backend's `detail` field (a string, or a list of
/// validation errors with `msg` fields); falls back to the raw body.
pub fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.detail {
            serde_json::Value::String(s) => return s,
            serde_json::Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !msgs.is_empty() {
                    return msgs.join("; ");
                }
            }
            _ => {}
        }
    }

    body.trim().chars().take(MAX_ERROR_BODY).collect()
}
