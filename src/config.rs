//! INI configuration file parser (sections `[tnc]`, `[gps]`, `[telemetry]`,
//! `[station]`, `[beaconing]`, `[static]`, `[comments]`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Result, TrackerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsType {
    Static,
    Serial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmartBeaconPoint {
    pub speed_mph: f64,
    pub interval_sec: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeaconTypes {
    pub wx: bool,
    pub phg: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhgConfig {
    pub power: u8,
    pub height: u8,
    pub gain: u8,
    pub directivity: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    pub mycall: String,
    pub icon_table: char,
    pub icon_code: char,
    pub digi_path: String,
    pub phg: PhgConfig,
    pub beacon_types: BeaconTypes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeaconingConfig {
    pub atrest_rate: u64,
    pub sb_low: SmartBeaconPoint,
    pub sb_high: SmartBeaconPoint,
    pub course_change_min: f64,
    pub course_change_slope: f64,
    pub after_stop: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StaticGpsConfig {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub speed: f64,
    pub course: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tnc_port: String,
    pub tnc_rate: u32,

    pub gps_port: String,
    pub gps_type: GpsType,
    pub gps_rate: u32,

    pub tel_port: String,
    pub tel_rate: u32,

    pub station: StationConfig,
    pub beaconing: BeaconingConfig,
    pub static_gps: StaticGpsConfig,
    pub comments: Vec<String>,

    pub display: String,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tnc_port: String::new(),
            tnc_rate: 9600,
            gps_port: String::new(),
            gps_type: GpsType::Static,
            gps_rate: 4800,
            tel_port: String::new(),
            tel_rate: 9600,
            station: StationConfig {
                mycall: "N0CAL-7".into(),
                icon_table: '/',
                icon_code: '>',
                digi_path: "WIDE1-1,WIDE2-1".into(),
                phg: PhgConfig { power: 0, height: 0, gain: 0, directivity: 0 },
                beacon_types: BeaconTypes::default(),
            },
            beaconing: BeaconingConfig {
                atrest_rate: 600,
                sb_low: SmartBeaconPoint { speed_mph: 10.0, interval_sec: 600 },
                sb_high: SmartBeaconPoint { speed_mph: 60.0, interval_sec: 60 },
                course_change_min: 30.0,
                course_change_slope: 255.0,
                after_stop: 180,
            },
            static_gps: StaticGpsConfig::default(),
            comments: Vec::new(),
            display: "/tmp/aprs.socket".into(),
            log_file: PathBuf::from("/tmp/aprs.log"),
        }
    }
}

/// Parse an INI file into a flat `(section, key) -> value` map. Lines
/// outside any `[section]`, blank lines and `#`/`;`-comment lines are
/// ignored.
fn parse_sections(content: &str) -> HashMap<(String, String), String> {
    let mut map = HashMap::new();
    let mut section = String::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_ascii_lowercase();
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = match parts.next() {
            Some(k) => k.trim().to_ascii_lowercase(),
            None => continue,
        };
        let val = match parts.next() {
            Some(v) => v.trim().to_string(),
            None => continue,
        };
        if !section.is_empty() {
            map.insert((section.clone(), key), val);
        }
    }
    map
}

fn get<'a>(map: &'a HashMap<(String, String), String>, section: &str, key: &str) -> Option<&'a str> {
    map.get(&(section.to_string(), key.to_string())).map(|s| s.as_str())
}

fn get_or<'a>(map: &'a HashMap<(String, String), String>, section: &str, key: &str, default: &'a str) -> &'a str {
    get(map, section, key).unwrap_or(default)
}

fn parse_or<T: std::str::FromStr>(map: &HashMap<(String, String), String>, section: &str, key: &str, default: T) -> T {
    get(map, section, key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Split a comma list (`posit,weather,phg`) into trimmed, non-empty parts.
fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

/// Parse `path` as a beaconing station INI configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| TrackerError::Config(format!("cannot read {}: {e}", path.display())))?;
    let map = parse_sections(&content);
    let mut cfg = Config::default();

    cfg.tnc_port = get_or(&map, "tnc", "port", "").to_string();
    cfg.tnc_rate = parse_or(&map, "tnc", "rate", 9600);

    cfg.gps_port = get_or(&map, "gps", "port", "").to_string();
    cfg.gps_type = match get_or(&map, "gps", "type", "static") {
        "serial" => GpsType::Serial,
        _ => GpsType::Static,
    };
    cfg.gps_rate = parse_or(&map, "gps", "rate", 4800);

    cfg.tel_port = get_or(&map, "telemetry", "port", "").to_string();
    cfg.tel_rate = parse_or(&map, "telemetry", "rate", 9600);

    cfg.station.mycall = get_or(&map, "station", "mycall", "N0CAL-7").to_string();
    let icon = get_or(&map, "station", "icon", "/>");
    let icon_chars: Vec<char> = icon.chars().collect();
    if icon_chars.len() != 2 {
        return Err(TrackerError::Config(format!(
            "station:icon must be exactly two characters, not `{icon}`"
        )));
    }
    cfg.station.icon_table = icon_chars[0];
    cfg.station.icon_code = icon_chars[1];
    cfg.station.digi_path = get_or(&map, "station", "digi_path", "WIDE1-1,WIDE2-1").to_string();
    cfg.station.phg = PhgConfig {
        power: parse_or(&map, "station", "power", 0),
        height: parse_or(&map, "station", "height", 0),
        gain: parse_or(&map, "station", "gain", 0),
        directivity: parse_or(&map, "station", "directivity", 0),
    };

    let beacon_types = get_or(&map, "station", "beacon_types", "posit");
    for t in split_list(beacon_types) {
        match t.as_str() {
            "posit" => {} // plain/status path is always available; nothing to enable
            "weather" => cfg.station.beacon_types.wx = true,
            "phg" => cfg.station.beacon_types.phg = true,
            other => warn!("unknown beacon type `{other}`"),
        }
    }

    cfg.beaconing = BeaconingConfig {
        atrest_rate: parse_or(&map, "beaconing", "atrest_rate", 600),
        sb_low: SmartBeaconPoint {
            speed_mph: parse_or(&map, "beaconing", "min_speed", 10.0),
            interval_sec: parse_or(&map, "beaconing", "min_rate", 600),
        },
        sb_high: SmartBeaconPoint {
            speed_mph: parse_or(&map, "beaconing", "max_speed", 60.0),
            interval_sec: parse_or(&map, "beaconing", "max_rate", 60),
        },
        course_change_min: parse_or(&map, "beaconing", "course_change_min", 30.0),
        course_change_slope: parse_or(&map, "beaconing", "course_change_slope", 255.0),
        after_stop: parse_or(&map, "beaconing", "after_stop", 180),
    };

    cfg.static_gps = StaticGpsConfig {
        lat: parse_or(&map, "static", "lat", 0.0),
        lon: parse_or(&map, "static", "lon", 0.0),
        alt: parse_or(&map, "static", "alt", 0.0),
        speed: parse_or(&map, "static", "speed", 0.0),
        course: parse_or(&map, "static", "course", 0.0),
    };

    let enabled = get_or(&map, "comments", "enabled", "");
    cfg.comments = split_list(enabled)
        .into_iter()
        .map(|name| get_or(&map, "comments", &name, "INVAL").to_string())
        .collect();

    Ok(cfg)
}

/// Validate cross-field invariants that can't be caught key-by-key.
pub fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.tnc_port.is_empty() {
        return Err(TrackerError::Config("tnc:port is required".into()));
    }
    if cfg.comments.is_empty() {
        return Err(TrackerError::Config("comments:enabled must name at least one comment".into()));
    }
    Ok(())
}
