//! Telemetry Store — the most recent temperature/voltage samples and when
//! they were last updated or last beaconed.

use crate::util::{has_been, now};

#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryStore {
    pub temp1: f64,
    pub voltage: f64,
    last_tel: u64,
    last_tel_beacon: u64,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `key=value` telemetry line. Recognized keys: `temp1`,
    /// `voltage` (both decimal). Returns `false` (and logs a warning via
    /// the caller) for unrecognized keys.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "temp1" => {
                if let Ok(v) = value.parse() {
                    self.temp1 = v;
                    self.last_tel = now();
                    true
                } else {
                    false
                }
            }
            "voltage" => {
                if let Ok(v) = value.parse() {
                    self.voltage = v;
                    self.last_tel = now();
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Fresh telemetry (used to gate the WX beacon type) is data received
    /// within the last `max_age_secs` seconds.
    pub fn is_fresh(&self, max_age_secs: u64) -> bool {
        !has_been(self.last_tel, max_age_secs)
    }

    pub fn mark_beaconed(&mut self) {
        self.last_tel_beacon = now();
    }

    pub fn last_beacon_age_ok(&self, min_interval_secs: u64) -> bool {
        has_been(self.last_tel_beacon, min_interval_secs)
    }
}
