//! Position Store — a small ring of recent GPS fixes.
//!
//! GGA and RMC sentences describe the same physical fix but carry different
//! fields (GGA: altitude/quality/sat count; RMC: date/speed/course). RMC
//! rotates the ring to a fresh slot so the next GGA fills in the fields RMC
//! doesn't carry, while GGA never rotates — it just updates whatever slot is
//! currently active. Only [`PositionStore::current`] is consulted by the
//! rest of the system.

use crate::nmea::{GgaData, RmcData};

const RING_LEN: usize = 4;

/// A single time-stamped positional sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub alt_ft: f64,
    pub speed_kt: f64,
    pub course_deg: f64,
    /// GPS fix quality: 0 = invalid, >=1 = locked.
    pub qual: u8,
    pub sats: u8,
    /// Packed HHMMSS.
    pub tstamp: u32,
    /// Packed DDMMYY.
    pub dstamp: u32,
}

impl Fix {
    /// A fix with `qual = 0` must never be encoded into a beacon.
    pub fn has_lock(&self) -> bool {
        self.qual >= 1
    }

    /// Gate for wall-clock setting from GPS time (spec §4.1 / original
    /// `set_time`): requires a lock and at least 3 satellites.
    pub fn eligible_for_time_set(&self) -> bool {
        self.qual != 0 && self.sats >= 3
    }
}

/// Ring of the most recently assembled fixes, with one "active" slot.
#[derive(Debug, Clone)]
pub struct PositionStore {
    ring: [Fix; RING_LEN],
    idx: usize,
}

impl Default for PositionStore {
    fn default() -> Self {
        Self {
            ring: [Fix::default(); RING_LEN],
            idx: 0,
        }
    }
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active fix.
    pub fn current(&self) -> Fix {
        self.ring[self.idx]
    }

    /// Advance to a fresh ring slot, carrying whatever stale fields were
    /// left there from `RING_LEN` fixes ago (matches the original's plain
    /// struct-array ring — nothing is zeroed on rotation).
    pub fn rotate(&mut self) {
        self.idx = (self.idx + 1) % RING_LEN;
    }

    /// GGA carries quality, satellite count and altitude into the active slot.
    pub fn apply_gga(&mut self, g: GgaData) {
        let fix = &mut self.ring[self.idx];
        fix.lat = g.lat;
        fix.lon = g.lon;
        fix.alt_ft = g.alt_ft;
        fix.qual = g.qual;
        fix.sats = g.sats;
    }

    /// RMC rotates to a new slot, then writes date/speed/course/time into it.
    pub fn apply_rmc(&mut self, r: RmcData) {
        self.rotate();
        let fix = &mut self.ring[self.idx];
        fix.lat = r.lat;
        fix.lon = r.lon;
        fix.speed_kt = r.speed_kt;
        fix.course_deg = r.course_deg;
        fix.tstamp = r.tstamp;
        fix.dstamp = r.dstamp;
    }

    /// Force the active fix to look like "no data" (used by the
    /// SmartBeaconing NODATA branch).
    pub fn clear_lock(&mut self) {
        let fix = &mut self.ring[self.idx];
        fix.qual = 0;
        fix.sats = 0;
    }

    /// Overwrite the active fix outright (used by the static/testing GPS
    /// source, which synthesizes a fix instead of parsing one).
    pub fn set_current(&mut self, fix: Fix) {
        self.ring[self.idx] = fix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gga_then_rmc_merge_into_one_logical_fix() {
        let mut store = PositionStore::new();
        // RMC rotates to a fresh slot first; the GGA that follows writes
        // quality/sats/altitude into that same, now-current slot without
        // rotating, so the two sentences land in one logical fix.
        store.apply_rmc(RmcData {
            lat: 37.5,
            lon: -122.3,
            speed_kt: 12.0,
            course_deg: 270.0,
            tstamp: 123456,
            dstamp: 010124,
        });
        store.apply_gga(GgaData {
            lat: 37.5,
            lon: -122.3,
            alt_ft: 100.0,
            qual: 1,
            sats: 6,
        });
        let fix = store.current();
        assert_eq!(fix.speed_kt, 12.0);
        assert_eq!(fix.course_deg, 270.0);
        assert_eq!(fix.qual, 1);
        assert_eq!(fix.sats, 6);
    }

    #[test]
    fn qual_zero_has_no_lock() {
        let fix = Fix { qual: 0, ..Default::default() };
        assert!(!fix.has_lock());
    }

    #[test]
    fn time_set_needs_lock_and_three_sats() {
        let fix = Fix { qual: 1, sats: 2, ..Default::default() };
        assert!(!fix.eligible_for_time_set());
        let fix = Fix { qual: 1, sats: 3, ..Default::default() };
        assert!(fix.eligible_for_time_set());
    }
}
