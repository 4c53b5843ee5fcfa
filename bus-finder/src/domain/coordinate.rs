//! Geographic coordinate type.

use std::fmt;

/// Error returned when a latitude/longitude pair is out of range or unparseable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A resolved WGS84 latitude/longitude pair.
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180];
/// any `Coordinate` value is valid by construction.
///
/// # Examples
///
/// ```
/// use bus_finder::domain::Coordinate;
///
/// let c = Coordinate::new(32.0853, 34.7818).unwrap();
/// assert_eq!(c.latitude(), 32.0853);
///
/// // Out of range is rejected
/// assert!(Coordinate::new(91.0, 0.0).is_err());
///
/// // Decimal strings, as the address search returns them
/// let c = Coordinate::parse("32.0853", "34.7818").unwrap();
/// assert_eq!(c.longitude(), 34.7818);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, validating both components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinate {
                reason: "components must be finite numbers",
            });
        }

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinate {
                reason: "latitude must be within [-90, 90]",
            });
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinate {
                reason: "longitude must be within [-180, 180]",
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a coordinate from decimal strings.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, InvalidCoordinate> {
        let lat = latitude.trim().parse::<f64>().map_err(|_| InvalidCoordinate {
            reason: "latitude is not a decimal number",
        })?;
        let lon = longitude.trim().parse::<f64>().map_err(|_| InvalidCoordinate {
            reason: "longitude is not a decimal number",
        })?;

        Self::new(lat, lon)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_range() {
        assert!(Coordinate::new(0.0, 0.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn parse_decimal_strings() {
        let c = Coordinate::parse(" 31.7683", "35.2137 ").unwrap();
        assert_eq!(c.latitude(), 31.7683);
        assert_eq!(c.longitude(), 35.2137);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Coordinate::parse("north", "35.0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid coordinate: latitude is not a decimal number"
        );
        assert!(Coordinate::parse("31.0", "").is_err());
        assert!(Coordinate::parse("NaN", "35.0").is_err());
    }

    #[test]
    fn display() {
        let c = Coordinate::new(32.08531, 34.78177).unwrap();
        assert_eq!(c.to_string(), "32.08531,34.78177");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every in-range pair is accepted and preserved exactly
        #[test]
        fn in_range_roundtrip(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let c = Coordinate::new(lat, lon).unwrap();
            prop_assert_eq!(c.latitude(), lat);
            prop_assert_eq!(c.longitude(), lon);
        }

        /// Latitudes beyond the poles are always rejected
        #[test]
        fn polar_overflow_rejected(lat in 90.0001f64..1000.0, lon in -180.0f64..=180.0) {
            prop_assert!(Coordinate::new(lat, lon).is_err());
            prop_assert!(Coordinate::new(-lat, lon).is_err());
        }

        /// String parsing agrees with numeric construction
        #[test]
        fn parse_matches_new(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let parsed = Coordinate::parse(&lat.to_string(), &lon.to_string()).unwrap();
            prop_assert_eq!(parsed, Coordinate::new(lat, lon).unwrap());
        }
    }
}
