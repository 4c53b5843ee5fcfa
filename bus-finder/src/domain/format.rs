//! Display rules for arrival times, distances and timestamps.

use chrono::NaiveDateTime;

/// Label for a minutes-until-arrival value.
///
/// ```
/// use bus_finder::domain::format_arrival;
///
/// assert_eq!(format_arrival(0), "now");
/// assert_eq!(format_arrival(1), "1 minute");
/// assert_eq!(format_arrival(7), "7 minutes");
/// ```
pub fn format_arrival(minutes: u32) -> String {
    match minutes {
        0 => "now".to_string(),
        1 => "1 minute".to_string(),
        n => format!("{n} minutes"),
    }
}

/// Label for a distance in meters: whole meters under 1 km, else km with
/// one decimal.
pub fn format_distance(meters: f64) -> String {
    let rounded = meters.round();
    if rounded < 1000.0 {
        format!("{} m", rounded as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Wall-clock label for a board's last update.
pub fn format_last_updated(at: &NaiveDateTime) -> String {
    at.format("%H:%M:%S").to_string()
}
