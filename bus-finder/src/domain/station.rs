//! Bus station types.

use std::fmt;
use std::str::FromStr;

use super::coordinate::Coordinate;

/// Maximum number of served lines shown for a station.
pub const LINE_PREVIEW_LEN: usize = 5;

/// Error returned when parsing an invalid station key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station key: {reason}")]
pub struct InvalidStationKey {
    reason: &'static str,
}

/// Numeric station key (the stop code printed on the sign).
///
/// ```
/// use bus_finder::domain::StationKey;
///
/// let key: StationKey = "21472".parse().unwrap();
/// assert_eq!(key.get(), 21472);
/// assert!("21a".parse::<StationKey>().is_err());
/// assert!("0".parse::<StationKey>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationKey(u64);

impl StationKey {
    /// Wrap a raw key. Zero is not a valid station key.
    pub fn new(raw: u64) -> Result<Self, InvalidStationKey> {
        if raw == 0 {
            return Err(InvalidStationKey {
                reason: "must be non-zero",
            });
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for StationKey {
    type Err = InvalidStationKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().parse::<u64>().map_err(|_| InvalidStationKey {
            reason: "must be a decimal number",
        })?;
        Self::new(raw)
    }
}

impl fmt::Debug for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationKey({})", self.0)
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bus station near a searched coordinate.
///
/// Identity is the station key; two `Station`s with the same key describe
/// the same physical stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    pub english_name: Option<String>,
    pub key: StationKey,
    pub location: Coordinate,
    /// Straight-line distance from the search center, in meters.
    pub distance_meters: f64,
    /// Served line identifiers, in backend order.
    pub lines: Vec<String>,
}

impl Station {
    /// The first few served lines plus how many were left out.
    pub fn line_preview(&self) -> (&[String], usize) {
        let shown = self.lines.len().min(LINE_PREVIEW_LEN);
        (&self.lines[..shown], self.lines.len() - shown)
    }
}

/// Result of a nearby-station lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStations {
    /// Stations within the radius, unique by key.
    pub stations: Vec<Station>,
    pub center: Coordinate,
    pub radius: u32,
    /// Count reported by the backend (before de-duplication).
    pub total_stations: usize,
}

impl NearbyStations {
    pub fn get(&self, key: StationKey) -> Option<&Station> {
        self.stations.iter().find(|s| s.key == key)
    }

    /// Station with the smallest distance to the center.
    pub fn nearest(&self) -> Option<&Station> {
        self.stations
            .iter()
            .min_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters))
    }
}
