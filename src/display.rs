//! Display Publisher — the station's only point of contact with the UI
//! process. `send` writes one name/value tuple at a time to a datagram
//! endpoint and never blocks the caller; a send failure is logged and
//! dropped, never propagated, since a UI hiccup must never stall ingest
//! or beaconing.

use std::net::{SocketAddr, UdpSocket};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};

use log::warn;

use crate::cache::HeardPacket;
use crate::position::Fix;
use crate::util::{direction, distance_miles, format_time, now};

const KEEP_PACKETS: usize = 8;

/// Where display tuples go: a filesystem datagram socket (the common
/// case, a co-located UI process) or a UDP endpoint (a UI on another
/// host, e.g. over a tethered link).
pub enum DisplaySink {
    Unix { path: PathBuf, socket: UnixDatagram },
    Udp { addr: SocketAddr, socket: UdpSocket },
}

impl DisplaySink {
    pub fn unix(path: &Path) -> std::io::Result<Self> {
        let socket = UnixDatagram::unbound()?;
        Ok(Self::Unix { path: path.to_path_buf(), socket })
    }

    pub fn udp(addr: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self::Udp { addr, socket })
    }

    /// Publish one `name=value` tuple. Never returns an error to the
    /// caller; failures are logged at `warn` and otherwise ignored.
    pub fn send(&self, name: &str, value: &str) {
        let line = format!("{name}={value}\n");
        let result = match self {
            DisplaySink::Unix { path, socket } => socket.send_to(line.as_bytes(), path).map(|_| ()),
            DisplaySink::Udp { addr, socket } => socket.send_to(line.as_bytes(), addr).map(|_| ()),
        };
        if let Err(e) = result {
            warn!("display send failed for {name}: {e}");
        }
    }
}

/// Render a WX report into the scrolling comment + the compact course
/// line, and push both.
pub fn display_wx(sink: &DisplaySink, packet: &HeardPacket) {
    let wx = packet.wx.unwrap_or_default();
    let mut report = String::new();
    match (wx.wind_dir_deg, wx.wind_speed_mph, wx.wind_gust_mph) {
        (Some(dir), Some(speed), Some(gust)) => {
            report.push_str(&format!("Wind {} {:.0}mph ({:.0} gst) ", direction(dir), speed, gust));
        }
        (Some(dir), Some(speed), None) => {
            report.push_str(&format!("Wind {} {:.0} mph ", direction(dir), speed));
        }
        _ => {}
    }
    if let Some(temp) = wx.temp_f {
        report.push_str(&format!("{:.0}F ", temp));
    }
    match (wx.rain_1h_in, wx.rain_24h_in) {
        (Some(h), Some(d)) => report.push_str(&format!("Rain {:.2}\"h{:.2}\"d ", h, d)),
        (Some(h), None) => report.push_str(&format!("Rain {:.2}\"h ", h)),
        (None, Some(d)) => report.push_str(&format!("Rain {:.2}\"d ", d)),
        (None, None) => {}
    }
    if let Some(hum) = wx.humidity_pct {
        report.push_str(&format!("Hum. {:>2}% ", hum));
    }
    sink.send("AI_COMMENT", report.trim_end());
    sink.send("AI_COURSE", packet.comment.as_deref().unwrap_or(""));
}

pub fn display_telemetry(sink: &DisplaySink) {
    sink.send("AI_COURSE", "(Telemetry)");
    sink.send("AI_COMMENT", "");
}

/// Decode a `PHG` string (`P H G D`, each one digit/char) into a readable
/// sentence, or report it as broken.
pub fn display_phg(sink: &DisplaySink, packet: &HeardPacket) {
    let phg = match &packet.phg {
        Some(p) if p.len() == 4 => p,
        _ => {
            sink.send("AI_COURSE", "(Broken PHG)");
            return;
        }
    };
    let chars: Vec<char> = phg.chars().collect();
    let power = chars[0].to_digit(10);
    let height = chars[1].to_digit(10);
    let gain = chars[2].to_digit(10);
    let dir = chars[3].to_digit(10);
    let (power, height, gain, dir) = match (power, height, gain, dir) {
        (Some(p), Some(h), Some(g), Some(d)) => (p, h, g, d),
        _ => {
            sink.send("AI_COURSE", "(Broken PHG)");
            return;
        }
    };
    let watts = power * power;
    let feet = 2f64.powi(height as i32) * 10.0;
    let dir_str = if dir == 0 { "omni".to_string() } else { direction(dir as f64 * 360.0 / 8.0).to_string() };
    sink.send("AI_COMMENT", &format!("Power {watts}W at {feet:.0}ft ({gain}dB gain @ {dir_str})"));
    sink.send("AI_COURSE", packet.comment.as_deref().unwrap_or(""));
}

/// Plain-position display: speed/course in the compact course field,
/// status or comment in the larger comment field. `is_new` mirrors the
/// original's `isnew` flag — when the callsign differs from the last one
/// shown, the fields are always pushed (even when empty) so stale text
/// from a previous station doesn't linger on screen.
pub fn display_posit(sink: &DisplaySink, packet: &HeardPacket, status: Option<&str>, is_new: bool) {
    match (packet.speed_kt, packet.course_deg) {
        (Some(speed), Some(course)) if speed > 0.0 => {
            sink.send("AI_COURSE", &format!("{:.0} MPH {}", speed * 1.15078, direction(course)));
        }
        _ if is_new => sink.send("AI_COURSE", ""),
        _ => {}
    }

    if let Some(status) = status {
        sink.send("AI_COMMENT", status);
    } else if let Some(comment) = &packet.comment {
        sink.send("AI_COMMENT", comment);
    } else if is_new {
        sink.send("AI_COMMENT", "");
    }
}

/// Distance + direction to a heard station, or `"via <digi>"` if the
/// packet is an echo of our own beacon.
pub fn display_dist_and_dir(sink: &DisplaySink, packet: &HeardPacket, mycall: &str, my_fix: &Fix) {
    let via = packet
        .path
        .iter()
        .find(|hop| hop.used)
        .map(|hop| hop.name.as_str())
        .unwrap_or("Direct");

    let line = if packet.callsign == mycall {
        format!("via {via}")
    } else if let (Some(lat), Some(lon)) = (packet.lat, packet.lon) {
        let dist = distance_miles(my_fix.lat, my_fix.lon, lat, lon);
        let bearing = crate::util::bearing_degrees(my_fix.lat, my_fix.lon, lat, lon);
        if let Some(alt) = packet.alt_ft {
            format!("{dist:5.1}mi {} ({alt:4.0} ft)", direction(bearing))
        } else {
            format!("{dist:5.1}mi {} via {via}", direction(bearing))
        }
    } else {
        String::new()
    };
    sink.send("AI_DISTANCE", &line);
}

/// Full per-packet composition, matching the original's dispatch order:
/// WX, then telemetry, then PHG, then plain position — first match wins.
pub fn display_packet(sink: &DisplaySink, packet: &HeardPacket, mycall: &str, my_fix: &Fix, is_new: bool) {
    sink.send("AI_CALLSIGN", &packet.callsign);
    display_dist_and_dir(sink, packet, mycall, my_fix);

    if packet.wx.is_some() {
        display_wx(sink, packet);
    } else if packet.telemetry.is_some() {
        display_telemetry(sink);
    } else if packet.phg.is_some() {
        display_phg(sink, packet);
    } else {
        display_posit(sink, packet, packet.status.as_deref(), is_new);
    }

    let icon = match (packet.symbol_table, packet.symbol_code) {
        (Some(t), Some(c)) => format!("{t}{c}"),
        _ => String::new(),
    };
    sink.send("AI_ICON", &icon);
}

fn recent_line(index: usize, packet: &HeardPacket, my_fix: &Fix) -> String {
    match (packet.lat, packet.lon) {
        (Some(lat), Some(lon)) => {
            let dist = distance_miles(my_fix.lat, my_fix.lon, lat, lon);
            let bearing = crate::util::bearing_degrees(my_fix.lat, my_fix.lon, lat, lon);
            format!("{index}: {:<9} {dist:3.0}mi {}", packet.callsign, direction(bearing))
        }
        _ => format!("{index}: {:<9}", packet.callsign),
    }
}

/// Refresh the `AL_00`..`AL_07` recent-station list, newest first, and
/// re-render the distance/direction line for the most recently heard
/// packet (whose own position may have just changed as our GPS fix
/// updated).
pub fn update_packets_ui(sink: &DisplaySink, recent: &[HeardPacket], mycall: &str, my_fix: &Fix) {
    if let Some(last) = recent.last() {
        display_dist_and_dir(sink, last, mycall, my_fix);
    }

    let mut newest_first: Vec<&HeardPacket> = recent.iter().rev().collect();
    newest_first.truncate(KEEP_PACKETS);

    for slot in 0..KEEP_PACKETS {
        let name = format!("AL_{slot:02}");
        let line = match newest_first.get(slot) {
            Some(packet) => recent_line(slot + 1, packet, my_fix),
            None => format!("{}:", slot + 1),
        };
        sink.send(&name, &line);
    }
}

const TZ_OFFSET_HOURS: i64 = 0;

/// Push the GPS status line and speed/altitude line to the display.
pub fn display_gps_info(sink: &DisplaySink, mycall: &str, fix: &Fix) {
    let status = if fix.has_lock() { "Locked" } else { "INVALID" };
    let mut hour = (fix.tstamp / 10000) as i64 + TZ_OFFSET_HOURS;
    if hour < 0 {
        hour += 24;
    }
    let min = (fix.tstamp / 100) % 100;
    let sec = fix.tstamp % 100;
    sink.send(
        "G_LATLON",
        &format!(
            "{:.5} {:.5}   Time {:02}:{:02}:{:02}   {status}: {:2} sats",
            fix.lat, fix.lon, hour, min, sec, fix.sats
        ),
    );

    if fix.speed_kt > 1.0 {
        sink.send(
            "G_SPD",
            &format!("{:.0} MPH {}, Alt {:.0} ft", fix.speed_kt * 1.15078, direction(fix.course_deg), fix.alt_ft),
        );
    } else {
        sink.send("G_SPD", &format!("Stationary, Alt {:.0} ft", fix.alt_ft));
    }

    sink.send("G_MYCALL", mycall);
}

/// Refresh the last-beacon age and signal-bar count. Called once a
/// second from the event loop's tick so the "X ago" text keeps counting
/// up between beacons, not just at the moment one goes out.
pub fn display_beacon_status(sink: &DisplaySink, last_beacon_unix: u64, sig_bars: u32) {
    let label = if last_beacon_unix == 0 {
        "Never".to_string()
    } else {
        format!("{} ago", format_time(now().saturating_sub(last_beacon_unix)))
    };
    sink.send("G_LASTBEACON", &label);
    sink.send("G_SIGBARS", &sig_bars.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix() -> Fix {
        Fix { lat: 37.0, lon: -122.0, qual: 1, sats: 6, ..Default::default() }
    }

    #[test]
    fn posit_speed_zero_shows_empty_course_when_new() {
        let sink = DisplaySink::unix(Path::new("/tmp/aprs-display-test.sock")).unwrap();
        let packet = HeardPacket { callsign: "N0CAL-7".into(), speed_kt: Some(0.0), ..Default::default() };
        // No assertions on the (unreachable, unbound) socket — this exercises
        // the branch logic without panicking.
        display_posit(&sink, &packet, None, true);
    }

    #[test]
    fn recent_line_with_position_includes_distance() {
        let packet = HeardPacket { callsign: "N0CAL-7".into(), lat: Some(37.1), lon: Some(-122.1), ..Default::default() };
        let line = recent_line(1, &packet, &fix());
        assert!(line.contains("mi"));
    }

    #[test]
    fn recent_line_without_position_is_bare() {
        let packet = HeardPacket { callsign: "N0CAL-7".into(), ..Default::default() };
        let line = recent_line(1, &packet, &fix());
        assert_eq!(line, "1: N0CAL-7  ");
    }
}
