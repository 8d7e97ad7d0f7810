//! Small helpers shared across the beaconing engine: elapsed-time testing,
//! human-readable durations, and compass-point formatting.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix seconds.
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `HAS_BEEN(t, n)`: true when more than `n` seconds have elapsed since `t`.
///
/// A zero timestamp ("never set") always satisfies this, so first-time
/// paths (time-set, beacon-status, etc.) activate immediately rather than
/// waiting out the threshold once.
pub fn has_been(t: u64, n: u64) -> bool {
    t == 0 || now().saturating_sub(t) > n
}

/// Render a duration in seconds the way the display expects: "1h23m",
/// "4m5s", "30 sec" (no hours/minutes component shown once it's zero).
pub fn format_time(secs: u64) -> String {
    if secs > 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs > 60 {
        if secs % 60 != 0 {
            format!("{}m{}s", secs / 60, secs % 60)
        } else {
            format!("{} min", secs / 60)
        }
    } else {
        format!("{secs} sec")
    }
}

/// Nearest 16-point compass abbreviation for a true-bearing in degrees.
pub fn direction(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE",
        "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
    ];
    let deg = degrees.rem_euclid(360.0);
    let idx = ((deg / 22.5) + 0.5).floor() as usize % 16;
    POINTS[idx]
}

/// Great-circle distance between two lat/lon pairs, in statute miles.
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_MI: f64 = 3958.8;
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_MI * c
}

/// True bearing from (lat1, lon1) to (lat2, lon2), in degrees, 0-360.
pub fn bearing_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_been_zero_is_trivially_true() {
        assert!(has_been(0, 600));
    }

    #[test]
    fn has_been_recent_is_false() {
        assert!(!has_been(now(), 600));
    }

    #[test]
    fn format_time_buckets() {
        assert_eq!(format_time(30), "30 sec");
        assert_eq!(format_time(125), "2m5s");
        assert_eq!(format_time(120), "2 min");
        assert_eq!(format_time(5400), "1h30m");
    }

    #[test]
    fn direction_cardinal_points() {
        assert_eq!(direction(0.0), "N");
        assert_eq!(direction(90.0), "E");
        assert_eq!(direction(180.0), "S");
        assert_eq!(direction(270.0), "W");
        assert_eq!(direction(359.9), "N");
    }
}
