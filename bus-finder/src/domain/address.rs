//! Address candidates returned by the address search.

use super::coordinate::{Coordinate, InvalidCoordinate};

/// An address candidate, in the rank order the backend returned it.
///
/// Coordinates are kept as the decimal strings the search answered with;
/// they are only parsed when the address is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    pub place_id: Option<String>,
    pub importance: Option<f64>,
}

impl Address {
    /// Create an address with just a name and coordinates.
    pub fn new(
        display_name: impl Into<String>,
        lat: impl Into<String>,
        lon: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            lat: lat.into(),
            lon: lon.into(),
            place_id: None,
            importance: None,
        }
    }

    /// Parse the candidate's coordinate.
    pub fn coordinate(&self) -> Result<Coordinate, InvalidCoordinate> {
        Coordinate::parse(&self.lat, &self.lon)
    }
}

/// Ranked address candidates for one query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddressMatches {
    pub addresses: Vec<Address>,
    /// The query as the backend echoed it.
    pub query: String,
}
