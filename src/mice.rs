//! MIC-E compressed position encoder — stuffs latitude, longitude, course
//! and speed into the AX.25 destination field plus a short binary payload.
//! The destination bytes double as an address and must stay in the
//! printable 0x30-0x7F range; the offset/bit biases below exist for that
//! reason, not for obfuscation.

use crate::position::Fix;

/// Get the `digit`th base-10 digit of `value` (digit 0 = units).
fn get_digit(value: i64, digit: u32) -> i64 {
    (value / 10i64.pow(digit)) % 10
}

/// Encode the six MIC-E destination-field characters for `fix`'s latitude,
/// longitude-sign and longitude-offset bits.
fn encode_destination(fix: &Fix) -> [u8; 6] {
    let lat_abs = fix.lat.abs();
    let ldeg = lat_abs.floor();
    let lmin = (lat_abs - ldeg) * 60.0;
    let l = (ldeg * 10000.0 + lmin * 100.0) as i64;

    let north: u8 = if fix.lat > 0.0 { 0x50 } else { 0x30 };
    let lonsc: u8 = if fix.lon.abs() > 100.0 { 0x50 } else { 0x30 };
    let west: u8 = if fix.lon > 0.0 { 0x30 } else { 0x50 };

    [
        (get_digit(l, 5) as u8) | 0x50,
        (get_digit(l, 4) as u8) | 0x30,
        (get_digit(l, 3) as u8) | 0x50,
        (get_digit(l, 2) as u8) | north,
        (get_digit(l, 1) as u8) | lonsc,
        (get_digit(l, 0) as u8) | west,
    ]
}

/// Longitude degrees byte, with the APRS MIC-E offset buckets.
fn encode_lon_degrees(lon_deg_abs: f64) -> u8 {
    let ldeg = lon_deg_abs.floor() as i64;
    let byte = if ldeg <= 9 {
        ldeg + 118
    } else if ldeg <= 99 {
        ldeg + 28
    } else if ldeg <= 109 {
        ldeg + 108
    } else {
        (ldeg - 100) + 28
    };
    byte as u8
}

/// Longitude minutes + hundredths bytes.
fn encode_lon_minutes(lon_deg_abs: f64) -> (u8, u8) {
    let ldeg = lon_deg_abs.floor();
    let lmin = (lon_deg_abs - ldeg) * 60.0;
    let whole = lmin.floor();
    let hundredths = ((lmin - whole) * 100.0).round();
    let min_byte = if lmin > 10.0 { whole + 28.0 } else { whole + 88.0 };
    (min_byte as u8, (hundredths + 28.0) as u8)
}

fn encode_speed_course(speed_kt: f64, course_deg: f64) -> (u8, u8, u8) {
    let spd_htk = ((speed_kt / 10.0) + 108.0) as u8;
    let spd_crs = (32.0 + ((speed_kt as i64 % 10) * 10) as f64 + (course_deg as i64 / 100) as f64) as u8;
    let crs_tud = ((course_deg as i64 % 100) as f64 + 28.0) as u8;
    (spd_htk, spd_crs, crs_tud)
}

/// Build a complete MIC-E beacon line (no trailing newline).
///
/// `icon` is `(table, code)`, matching the plain encoder's convention;
/// MIC-E emits them in the opposite order (code, then table).
pub fn encode(mycall: &str, fix: &Fix, digi_path: &str, icon: (char, char)) -> String {
    let dest = encode_destination(fix);
    let lon_deg = encode_lon_degrees(fix.lon.abs());
    let (lon_min, lon_hun) = encode_lon_minutes(fix.lon.abs());
    let (spd_htk, spd_crs, crs_tud) = encode_speed_course(fix.speed_kt, fix.course_deg);
    let (table, code) = icon;

    format!(
        "{mycall}>{}{}{}{}{}{},{digi_path}:`{}{}{}{}{}{}{}{}",
        dest[0] as char,
        dest[1] as char,
        dest[2] as char,
        dest[3] as char,
        dest[4] as char,
        dest[5] as char,
        lon_deg as char,
        lon_min as char,
        lon_hun as char,
        spd_htk as char,
        spd_crs as char,
        crs_tud as char,
        code,
        table,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_bytes_are_printable() {
        let fix = Fix {
            lat: 45.0,
            lon: -120.0,
            speed_kt: 60.0,
            course_deg: 90.0,
            ..Default::default()
        };
        let dest = encode_destination(&fix);
        for b in dest {
            assert!((0x30..=0x7F).contains(&b), "byte {b:#x} out of range");
        }
    }

    #[test]
    fn scenario_lat45_lon120_digits() {
        // lat=45.0 exactly -> ldeg=45, lmin=0 -> L = 450000, digits 4 5 0 0 0 0
        let fix = Fix {
            lat: 45.0,
            lon: -120.0,
            speed_kt: 60.0,
            course_deg: 90.0,
            ..Default::default()
        };
        let dest = encode_destination(&fix);
        // digit-5=4 | 0x50, digit-4=5 | 0x30, digit-3=0 | 0x50,
        // digit-2=0 | north(lat>0 => 0x50), digit-1=0 | lonsc(|lon|>100 => 0x50),
        // digit-0=0 | west(lon<0 => 0x50)
        assert_eq!(dest[0], 4 | 0x50);
        assert_eq!(dest[1], 5 | 0x30);
        assert_eq!(dest[2], 0 | 0x50);
        assert_eq!(dest[3], 0 | 0x50);
        assert_eq!(dest[4], 0 | 0x50);
        assert_eq!(dest[5], 0 | 0x50);
    }

    #[test]
    fn encode_produces_expected_shape() {
        let fix = Fix {
            lat: 45.0,
            lon: -120.0,
            speed_kt: 60.0,
            course_deg: 90.0,
            ..Default::default()
        };
        let packet = encode("N0CAL-7", &fix, "WIDE2-1", ('/', '>'));
        assert!(packet.starts_with("N0CAL-7>"));
        assert!(packet.contains(",WIDE2-1:`"));
        // destination + payload: 6 dest chars, comma, path, ":`", 8 payload bytes
        let after_colon = packet.split(":`").nth(1).unwrap();
        assert_eq!(after_colon.chars().count(), 8);
    }
}
