//! Minimal inbound APRS-text decoder: turns a deframed KISS payload
//! (already converted from AX.25 to its printable TNC2 form, `SRC>DEST,PATH:info`)
//! into a [`HeardPacket`]. Stands in for the third-party packet parser the
//! station controller otherwise treats as an opaque external helper —
//! only position (`!`/`=`), status (`>`) and a simplified positionless
//! weather report are decoded; anything else (messages, objects, third
//! party traffic) is returned as a comment-only packet.

use crate::cache::{HeardPacket, PathHop, WxReport};

#[derive(Debug)]
pub enum DecodeError {
    NoPathSeparator,
    NoInfoSeparator,
    EmptyInfo,
}

fn parse_path(path: &str) -> Vec<PathHop> {
    path.split(',')
        .filter(|p| !p.is_empty())
        .map(|hop| {
            if let Some(name) = hop.strip_suffix('*') {
                PathHop { name: name.to_string(), used: true }
            } else {
                PathHop { name: hop.to_string(), used: false }
            }
        })
        .collect()
}

fn nmea_style_to_decimal(deg_min: &str, hemi: char) -> Option<f64> {
    // e.g. "3707.41N" / "12232.59W": degrees are the digits before the last
    // two whole-minute digits, the rest (including the decimal) is minutes.
    let digits_end = deg_min.find('.').unwrap_or(deg_min.len());
    if digits_end < 2 {
        return None;
    }
    let deg_str = &deg_min[..digits_end - 2];
    let min_str = &deg_min[digits_end - 2..];
    let deg: f64 = deg_str.parse().ok()?;
    let min: f64 = min_str.parse().ok()?;
    let mut value = deg + min / 60.0;
    if hemi == 'S' || hemi == 'W' {
        value = -value;
    }
    Some(value)
}

fn parse_plain_position(info: &str) -> Option<(f64, f64, char, char, Option<f64>, Option<f64>, String)> {
    // !DDMM.mmH<table>DDDMM.mmH<code>[CCC/SSS]comment
    let body = &info[1..];
    if body.len() < 19 {
        return None;
    }
    let lat_field = &body[0..8];
    let table = body.as_bytes()[8] as char;
    let lon_field = &body[9..18];
    let code = body.as_bytes()[18] as char;
    let rest = &body[19..];

    let lat = nmea_style_to_decimal(&lat_field[..7], lat_field.as_bytes()[7] as char)?;
    let lon = nmea_style_to_decimal(&lon_field[..8], lon_field.as_bytes()[8] as char)?;

    let (course, speed, comment) = if rest.len() >= 7 && rest.as_bytes()[3] == b'/' {
        let course: f64 = rest[0..3].parse().ok()?;
        let speed: f64 = rest[4..7].parse().ok()?;
        (Some(course), Some(speed), rest[7..].to_string())
    } else {
        (None, None, rest.to_string())
    };

    Some((lat, lon, table, code, course, speed, comment))
}

/// A positionless weather report (`_` data type, no lat/lon): wind
/// direction/speed, temperature, each a fixed-width field à la
/// `_DDD/SSSgGGGtTTT`. Any field can be missing (`...`).
fn parse_weather(body: &str) -> WxReport {
    let mut wx = WxReport::default();
    let mut rest = body;
    while rest.len() >= 4 {
        let tag = rest.as_bytes()[0] as char;
        let value_str = &rest[1..4];
        let value: Option<f64> = value_str.parse().ok();
        match tag {
            'c' => wx.wind_dir_deg = value,
            's' => wx.wind_speed_mph = value,
            'g' => wx.wind_gust_mph = value,
            't' => wx.temp_f = value,
            'h' => wx.humidity_pct = value_str.parse().ok(),
            _ => {}
        }
        rest = &rest[4..];
    }
    wx
}

/// Decode one TNC2-style text packet into a [`HeardPacket`].
pub fn decode(text: &str) -> Result<HeardPacket, DecodeError> {
    let gt = text.find('>').ok_or(DecodeError::NoPathSeparator)?;
    let callsign = text[..gt].to_string();
    let after_call = &text[gt + 1..];
    let colon = after_call.find(':').ok_or(DecodeError::NoInfoSeparator)?;
    let path_field = &after_call[..colon];
    let info = &after_call[colon + 1..];

    if info.is_empty() {
        return Err(DecodeError::EmptyInfo);
    }

    let path = parse_path(path_field);
    let mut packet = HeardPacket { callsign, path, ..Default::default() };

    match info.as_bytes()[0] {
        b'!' | b'=' => {
            if let Some((lat, lon, table, code, course, speed, comment)) = parse_plain_position(info) {
                packet.lat = Some(lat);
                packet.lon = Some(lon);
                packet.symbol_table = Some(table);
                packet.symbol_code = Some(code);
                packet.course_deg = course;
                packet.speed_kt = speed;
                if !comment.is_empty() {
                    packet.comment = Some(comment);
                }
            } else {
                packet.comment = Some(info[1..].to_string());
            }
        }
        b'>' => {
            packet.status = Some(info[1..].to_string());
        }
        b'_' => {
            packet.wx = Some(parse_weather(&info[1..]));
        }
        _ => {
            packet.comment = Some(info.to_string());
        }
    }

    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_position_with_course_speed() {
        let pkt = decode("N0CAL-7>APZDMS,WIDE1-1:!3707.41N/12232.59W>217/042hi").unwrap();
        assert_eq!(pkt.callsign, "N0CAL-7");
        assert_eq!(pkt.path, vec![PathHop { name: "WIDE1-1".into(), used: false }]);
        assert!((pkt.lat.unwrap() - 37.12350).abs() < 1e-3);
        assert!((pkt.lon.unwrap() + 122.5432).abs() < 1e-2);
        assert_eq!(pkt.course_deg, Some(217.0));
        assert_eq!(pkt.speed_kt, Some(42.0));
        assert_eq!(pkt.comment.as_deref(), Some("hi"));
    }

    #[test]
    fn used_hop_marker_is_tracked() {
        let pkt = decode("N0CAL-7>APZDMS,WIDE1-1*,WIDE2-1:!3707.41N/12232.59W>hi").unwrap();
        assert_eq!(pkt.path[0].used, true);
        assert_eq!(pkt.path[1].used, false);
    }

    #[test]
    fn decodes_status() {
        let pkt = decode("N0CAL-7>APZDMS:>On the road").unwrap();
        assert_eq!(pkt.status.as_deref(), Some("On the road"));
    }

    #[test]
    fn decodes_weather_fields() {
        let pkt = decode("WX1-1>APZDMS:_c180s012g020t075").unwrap();
        let wx = pkt.wx.unwrap();
        assert_eq!(wx.wind_dir_deg, Some(180.0));
        assert_eq!(wx.wind_speed_mph, Some(12.0));
        assert_eq!(wx.wind_gust_mph, Some(20.0));
        assert_eq!(wx.temp_f, Some(75.0));
    }

    #[test]
    fn missing_path_separator_is_an_error() {
        assert!(matches!(decode("garbage"), Err(DecodeError::NoPathSeparator)));
    }

    #[test]
    fn missing_info_separator_is_an_error() {
        assert!(matches!(decode("N0CAL-7>APZDMS"), Err(DecodeError::NoInfoSeparator)));
    }
}
