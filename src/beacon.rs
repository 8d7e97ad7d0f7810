//! Beacon encoders: plain-position, status, and the WX/PHG/NONE data
//! selector that picks what goes after the lat/lon in a position beacon.

use crate::config::{BeaconTypes, PhgConfig};
use crate::position::Fix;

const DEST_ADDR: &str = "APZDMS";

/// `DDMM.hhH` — two-digit degrees, minutes to two decimals, hemisphere.
fn format_lat(lat: f64) -> String {
    let abs = lat.abs();
    let deg = abs.floor();
    let min = (abs - deg) * 60.0;
    format!("{:02.0}{:05.2}{}", deg, min, if lat > 0.0 { 'N' } else { 'S' })
}

/// `DDDMM.hhH` — three-digit degrees, minutes to two decimals, hemisphere.
fn format_lon(lon: f64) -> String {
    let abs = lon.abs();
    let deg = abs.floor();
    let min = (abs - deg) * 60.0;
    format!("{:03.0}{:05.2}{}", deg, min, if lon > 0.0 { 'E' } else { 'W' })
}

/// `CCC/SSS` (course then speed, zero-padded) when speed exceeds 5 knots,
/// empty otherwise.
fn format_course_speed(fix: &Fix) -> String {
    if fix.speed_kt > 5.0 {
        format!("{:03.0}/{:03.0}", fix.course_deg, fix.speed_kt)
    } else {
        String::new()
    }
}

/// Encode a plain (`!`-prefixed) ASCII position beacon.
///
/// `icon` is `(table, code)`; the caller resolves any WX override (icon
/// code `_`) before calling this, via [`choose_data`].
pub fn encode_plain(mycall: &str, fix: &Fix, digi_path: &str, icon: (char, char), payload: &str) -> String {
    let (table, code) = icon;
    format!(
        "{mycall}>{DEST_ADDR},{digi_path}:!{}{table}{}{code}{}{payload}",
        format_lat(fix.lat),
        format_lon(fix.lon),
        format_course_speed(fix),
    )
}

/// Encode a status (`>`-prefixed) beacon.
pub fn encode_status(mycall: &str, digi_path: &str, payload: &str) -> String {
    format!("{mycall}>{DEST_ADDR},{digi_path}:>{payload}")
}

/// Result of the data-type selector: an optional icon-code override (WX
/// forces the weather-station icon `_`) plus the payload text to append
/// after the lat/lon in a plain beacon.
pub struct SelectedData {
    pub icon_code_override: Option<char>,
    pub payload: String,
}

/// Three-way cyclic fall-through selector (spec'd as WX, PHG, NONE in that
/// order). `cursor` is advanced by one on every call regardless of which
/// slot ends up firing. NONE is unconditional, so the loop always
/// terminates with a payload inside three iterations even when starting
/// mid-cycle.
pub fn choose_data(
    cursor: &mut u32,
    allowed: BeaconTypes,
    telemetry_fresh: bool,
    temp_f: f64,
    phg: PhgConfig,
    comment: String,
) -> SelectedData {
    let start = *cursor % 3;
    *cursor = cursor.wrapping_add(1);

    for offset in 0..3u32 {
        match (start + offset) % 3 {
            0 => {
                if allowed.wx && telemetry_fresh {
                    return SelectedData {
                        icon_code_override: Some('_'),
                        payload: format!(".../...t{:03.0}{comment}", temp_f),
                    };
                }
            }
            1 => {
                if allowed.phg {
                    return SelectedData {
                        icon_code_override: None,
                        payload: format!(
                            "PHG{}{}{}{}{comment}",
                            phg.power, phg.height, phg.gain, phg.directivity
                        ),
                    };
                }
            }
            _ => {
                return SelectedData {
                    icon_code_override: None,
                    payload: comment,
                };
            }
        }
    }
    unreachable!("NONE slot is always unconditional within 3 iterations")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lon: f64, speed: f64, course: f64) -> Fix {
        Fix { lat, lon, speed_kt: speed, course_deg: course, qual: 1, sats: 5, ..Default::default() }
    }

    #[test]
    fn scenario_1_stationary_plain_beacon() {
        let f = fix(37.12345, -122.5432, 0.0, 0.0);
        let packet = encode_plain("N0CAL-7", &f, "WIDE1-1", ('/', '>'), "hi");
        assert_eq!(packet, "N0CAL-7>APZDMS,WIDE1-1:!3707.41N/12232.59W>hi");
    }

    #[test]
    fn scenario_2_moving_course_speed_field() {
        let f = fix(37.12345, -122.5432, 42.0, 217.0);
        let packet = encode_plain("N0CAL-7", &f, "WIDE1-1", ('/', '>'), "hi");
        assert!(packet.contains("217/042"));
    }

    #[test]
    fn slow_speed_has_no_course_speed_field() {
        let f = fix(10.0, 10.0, 5.0, 90.0);
        assert_eq!(format_course_speed(&f), "");
    }

    #[test]
    fn none_slot_always_reachable_mid_cycle() {
        let mut cursor = 2; // start mid-cycle, at the PHG slot
        let phg = PhgConfig { power: 0, height: 0, gain: 0, directivity: 0 };
        let sel = choose_data(&mut cursor, BeaconTypes::default(), false, 0.0, phg, "c".into());
        assert_eq!(sel.payload, "c");
        assert!(sel.icon_code_override.is_none());
    }

    #[test]
    fn wx_requires_fresh_telemetry() {
        let mut cursor = 0;
        let phg = PhgConfig { power: 0, height: 0, gain: 0, directivity: 0 };
        let allowed = BeaconTypes { wx: true, phg: false };
        let sel = choose_data(&mut cursor, allowed, false, 75.0, phg, "c".into());
        // telemetry stale -> falls through WX to PHG (disallowed) to NONE
        assert_eq!(sel.payload, "c");

        let mut cursor = 0;
        let sel = choose_data(&mut cursor, allowed, true, 75.0, phg, "c".into());
        assert_eq!(sel.icon_code_override, Some('_'));
        assert_eq!(sel.payload, ".../...t075c");
    }

    #[test]
    fn phg_payload_digits() {
        let mut cursor = 1; // start at PHG slot
        let phg = PhgConfig { power: 1, height: 2, gain: 3, directivity: 4 };
        let allowed = BeaconTypes { wx: false, phg: true };
        let sel = choose_data(&mut cursor, allowed, false, 0.0, phg, "c".into());
        assert_eq!(sel.payload, "PHG1234c");
    }
}
