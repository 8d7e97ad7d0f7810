//! NMEA 0183 sentence parsing: checksum validation and the two sentence
//! types the station cares about, GPGGA (fix quality/altitude/sat count)
//! and GPRMC (date/speed/course). Lines with an invalid checksum, or an
//! unrecognized prefix, are dropped silently — the position store never
//! changes state for them.

use crate::position::PositionStore;

/// Fields contributed by a GGA sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GgaData {
    pub lat: f64,
    pub lon: f64,
    pub alt_ft: f64,
    pub qual: u8,
    pub sats: u8,
}

/// Fields contributed by an RMC sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmcData {
    pub lat: f64,
    pub lon: f64,
    pub speed_kt: f64,
    pub course_deg: f64,
    pub tstamp: u32,
    pub dstamp: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentence {
    Gga(GgaData),
    Rmc(RmcData),
}

/// Parse one line of GPS serial output (already stripped of its trailing
/// `\r`) into a [`Sentence`], rejecting bad checksums and unknown prefixes.
pub fn parse_sentence(line: &str) -> Option<Sentence> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.contains('*') && !checksum_ok(line) {
        return None;
    }
    let body = line.trim_start_matches('$');
    let body = body.split('*').next().unwrap_or(body);
    let fields: Vec<&str> = body.split(',').collect();
    match *fields.first()? {
        "GPGGA" | "GNGGA" => parse_gga(&fields).map(Sentence::Gga),
        "GPRMC" | "GNRMC" => parse_rmc(&fields).map(Sentence::Rmc),
        _ => None,
    }
}

/// Apply one already-validated sentence to a [`PositionStore`]. Returns
/// `true` if the sentence carried fix data (used by the caller to refresh
/// the "last GPS data received" timestamp).
pub fn apply_sentence(store: &mut PositionStore, sentence: Sentence) -> bool {
    match sentence {
        Sentence::Gga(g) => {
            store.apply_gga(g);
            true
        }
        Sentence::Rmc(r) => {
            store.apply_rmc(r);
            true
        }
    }
}

/// $GPGGA,hhmmss.ss,llll.ll,a,yyyyy.yy,a,q,nsat,hdop,alt,M,...
fn parse_gga(f: &[&str]) -> Option<GgaData> {
    if f.len() < 10 {
        return None;
    }
    let qual: u8 = f[6].parse().unwrap_or(0);
    let sats: u8 = f[7].parse().unwrap_or(0);
    let alt_m: f64 = f[9].parse().unwrap_or(0.0);
    let lat = nmea_to_decimal(f[2], f[3])?;
    let lon = nmea_to_decimal(f[4], f[5])?;
    Some(GgaData {
        lat,
        lon,
        alt_ft: alt_m * 3.28084,
        qual,
        sats,
    })
}

/// $GPRMC,hhmmss.ss,A,llll.ll,a,yyyyy.yy,a,speed_kt,course,ddmmyy,...
fn parse_rmc(f: &[&str]) -> Option<RmcData> {
    if f.len() < 10 {
        return None;
    }
    if f[2] != "A" {
        return None;
    }
    let lat = nmea_to_decimal(f[3], f[4])?;
    let lon = nmea_to_decimal(f[5], f[6])?;
    let speed_kt: f64 = f[7].parse().unwrap_or(0.0);
    let course_deg: f64 = f[8].parse().unwrap_or(0.0);
    let tstamp = parse_packed_digits(f[1]);
    let dstamp = parse_packed_digits(f[9]);
    Some(RmcData {
        lat,
        lon,
        speed_kt,
        course_deg,
        tstamp,
        dstamp,
    })
}

/// Take the leading run of digits of a field (dropping any `.ss` fraction
/// on a time field) and parse it as `HHMMSS` / `DDMMYY`.
fn parse_packed_digits(field: &str) -> u32 {
    let digits: String = field.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Convert an NMEA `DDDMM.mmm` + hemisphere pair into signed decimal degrees.
fn nmea_to_decimal(coord: &str, hemi: &str) -> Option<f64> {
    if coord.is_empty() {
        return None;
    }
    let dot = coord.find('.')?;
    if dot < 2 {
        return None;
    }
    let deg_digits = dot - 2;
    let degrees: f64 = coord[..deg_digits].parse().ok()?;
    let minutes: f64 = coord[deg_digits..].parse().ok()?;
    let mut decimal = degrees + minutes / 60.0;
    if hemi == "S" || hemi == "W" {
        decimal = -decimal;
    }
    Some(decimal)
}

/// Validate the XOR checksum of an NMEA sentence (the part between `$`
/// and `*`).
fn checksum_ok(line: &str) -> bool {
    let inner = line.trim_start_matches('$');
    let mut parts = inner.splitn(2, '*');
    let body = match parts.next() {
        Some(b) => b,
        None => return false,
    };
    let expected_hex = match parts.next() {
        Some(h) => h.trim(),
        None => return false,
    };
    let expected: u8 = match u8::from_str_radix(expected_hex, 16) {
        Ok(v) => v,
        Err(_) => return false,
    };
    let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);
    actual == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_gga_parses() {
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
        match parse_sentence(line) {
            Some(Sentence::Gga(g)) => {
                assert!((g.lat - 48.1173).abs() < 0.001);
                assert_eq!(g.qual, 1);
                assert_eq!(g.sats, 8);
            }
            other => panic!("expected Gga, got {other:?}"),
        }
    }

    #[test]
    fn valid_rmc_parses() {
        let line = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
        match parse_sentence(line) {
            Some(Sentence::Rmc(r)) => {
                assert_eq!(r.tstamp, 123519);
                assert_eq!(r.dstamp, 230394);
                assert_eq!(r.speed_kt, 22.4);
            }
            other => panic!("expected Rmc, got {other:?}"),
        }
    }

    #[test]
    fn invalid_checksum_dropped() {
        let line = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00";
        assert!(parse_sentence(line).is_none());
    }

    #[test]
    fn void_fix_rmc_dropped() {
        let line = "$GPRMC,123519,V,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
        assert!(parse_sentence(line).is_none());
    }

    #[test]
    fn unknown_prefix_ignored() {
        assert!(parse_sentence("$GPGSV,3,1,11*55").is_none());
    }
}
