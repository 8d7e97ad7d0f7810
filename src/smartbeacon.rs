//! SmartBeaconing decision logic: given the current fix and the beacon
//! history, decide whether to transmit now and why. A pure function over
//! its inputs — the scheduler owns `last_beacon`, `last_moving` and
//! `last_gps_data` and mutates them based on the outcome.

use crate::config::BeaconingConfig;
use crate::position::Fix;

const HARD_FLOOR_SECS: u64 = 10;
const GPS_DATA_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    NoData,
    NoLock,
    Stopped,
    AtRest,
    Course,
    SlowTo,
    FastTo,
    Fracto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Skip,
    Now,
    /// Beacon once more than `_0` seconds have elapsed since the last one.
    After(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub outcome: Outcome,
    /// `None` only for the unconditional 10-second hard floor, which the
    /// original never surfaces to the display.
    pub reason: Option<Reason>,
}

impl Decision {
    /// Resolve an `Outcome` against the elapsed time since the last
    /// beacon, the way the caller is meant to.
    pub fn should_beacon_now(&self, since_last_beacon_secs: u64) -> bool {
        match self.outcome {
            Outcome::Skip => false,
            Outcome::Now => true,
            Outcome::After(interval) => since_last_beacon_secs > interval,
        }
    }
}

fn course_change_threshold(cfg: &BeaconingConfig, speed_mph: f64) -> f64 {
    cfg.course_change_min + cfg.course_change_slope / speed_mph
}

/// Decide whether to beacon right now.
///
/// `fix` is taken by mutable reference because the NODATA branch forces
/// it to look unlocked (`qual = sats = 0`), matching the original's
/// in-place mutation of the live position — a later SmartBeaconing call
/// that reads the same fix sees the forced state too.
pub fn decide(
    cfg: &BeaconingConfig,
    fix: &mut Fix,
    since_last_beacon_secs: u64,
    since_last_gps_data_secs: u64,
    last_beacon_course: Option<f64>,
    last_moving: &mut Option<u64>,
    now: u64,
) -> Decision {
    if since_last_beacon_secs < HARD_FLOOR_SECS {
        return Decision { outcome: Outcome::Skip, reason: None };
    }

    if since_last_gps_data_secs >= GPS_DATA_TIMEOUT_SECS {
        fix.qual = 0;
        fix.sats = 0;
        return Decision { outcome: Outcome::Skip, reason: Some(Reason::NoData) };
    }

    if fix.qual == 0 {
        return Decision { outcome: Outcome::Skip, reason: Some(Reason::NoLock) };
    }

    if let Some(moving_since) = *last_moving {
        if now.saturating_sub(moving_since) > cfg.after_stop {
            *last_moving = None;
            return Decision { outcome: Outcome::Now, reason: Some(Reason::Stopped) };
        }
    }

    if fix.speed_kt <= 1.0 {
        return Decision { outcome: Outcome::After(cfg.atrest_rate), reason: Some(Reason::AtRest) };
    }

    let speed_mph = fix.speed_kt * 1.15078;

    if let Some(last_course) = last_beacon_course {
        let delta = (last_course - fix.course_deg).abs();
        let thresh = course_change_threshold(cfg, speed_mph);
        if delta > thresh && speed_mph > 2.0 {
            return Decision { outcome: Outcome::Now, reason: Some(Reason::Course) };
        }
    }

    if speed_mph < cfg.sb_low.speed_mph {
        return Decision { outcome: Outcome::After(cfg.sb_low.interval_sec), reason: Some(Reason::SlowTo) };
    }
    if speed_mph > cfg.sb_high.speed_mph {
        return Decision { outcome: Outcome::After(cfg.sb_high.interval_sec), reason: Some(Reason::FastTo) };
    }

    let d_speed = cfg.sb_high.speed_mph - cfg.sb_low.speed_mph;
    let d_rate = cfg.sb_low.interval_sec as f64 - cfg.sb_high.interval_sec as f64;
    let speed_frac = (speed_mph - cfg.sb_low.speed_mph) / d_speed;
    let interval = (d_rate * (1.0 - speed_frac) + cfg.sb_high.interval_sec as f64).round() as u64;
    Decision { outcome: Outcome::After(interval), reason: Some(Reason::Fracto) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmartBeaconPoint;

    fn cfg() -> BeaconingConfig {
        BeaconingConfig {
            atrest_rate: 600,
            sb_low: SmartBeaconPoint { speed_mph: 10.0, interval_sec: 600 },
            sb_high: SmartBeaconPoint { speed_mph: 60.0, interval_sec: 60 },
            course_change_min: 30.0,
            course_change_slope: 255.0,
            after_stop: 180,
        }
    }

    fn fix(speed_kt: f64, course: f64, qual: u8) -> Fix {
        Fix { speed_kt, course_deg: course, qual, sats: 5, ..Default::default() }
    }

    #[test]
    fn hard_floor_blocks_everything_with_no_reason() {
        let d = decide(&cfg(), &mut fix(40.0, 90.0, 1), 5, 0, None, &mut None, 1_000);
        assert_eq!(d.outcome, Outcome::Skip);
        assert_eq!(d.reason, None);
    }

    #[test]
    fn stale_gps_forces_unlock_and_nodata() {
        let mut f = fix(10.0, 0.0, 1);
        let d = decide(&cfg(), &mut f, 60, 31, None, &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::NoData));
        assert_eq!(f.qual, 0);
        assert_eq!(f.sats, 0);
    }

    #[test]
    fn no_lock_skips() {
        let d = decide(&cfg(), &mut fix(10.0, 0.0, 0), 60, 0, None, &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::NoLock));
        assert_eq!(d.outcome, Outcome::Skip);
    }

    #[test]
    fn recently_stopped_fires_once_then_clears() {
        let mut moving = Some(800u64);
        let d = decide(&cfg(), &mut fix(0.0, 0.0, 1), 60, 0, None, &mut moving, 1_000);
        assert_eq!(d.reason, Some(Reason::Stopped));
        assert_eq!(d.outcome, Outcome::Now);
        assert_eq!(moving, None);
    }

    #[test]
    fn atrest_below_one_knot() {
        let d = decide(&cfg(), &mut fix(0.5, 0.0, 1), 60, 0, None, &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::AtRest));
        assert_eq!(d.outcome, Outcome::After(600));
    }

    #[test]
    fn scenario_4_highway_speed_uses_fast_interval() {
        let d = decide(&cfg(), &mut fix(65.0, 180.0, 1), 60, 0, Some(180.0), &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::FastTo));
        assert_eq!(d.outcome, Outcome::After(60));
    }

    #[test]
    fn scenario_5_course_change_fires_now() {
        let d = decide(&cfg(), &mut fix(13.0, 300.0, 1), 15, 0, Some(10.0), &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::Course));
        assert_eq!(d.outcome, Outcome::Now);
    }

    #[test]
    fn small_course_change_does_not_fire_early() {
        let d = decide(&cfg(), &mut fix(13.0, 95.0, 1), 15, 0, Some(90.0), &mut None, 1_000);
        assert_ne!(d.reason, Some(Reason::Course));
    }

    #[test]
    fn below_low_breakpoint_is_slowto() {
        let d = decide(&cfg(), &mut fix(5.0, 0.0, 1), 60, 0, None, &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::SlowTo));
        assert_eq!(d.outcome, Outcome::After(600));
    }

    #[test]
    fn fractional_interval_interpolates_between_breakpoints() {
        let speed_kt = 35.0 / 1.15078; // ~35mph, midpoint of [10,60]
        let d = decide(&cfg(), &mut fix(speed_kt, 0.0, 1), 1000, 0, None, &mut None, 1_000);
        assert_eq!(d.reason, Some(Reason::Fracto));
        match d.outcome {
            Outcome::After(secs) => assert!(secs > 60 && secs < 600),
            _ => panic!("expected After"),
        }
    }

    #[test]
    fn should_beacon_now_resolves_after_outcome() {
        let d = Decision { outcome: Outcome::After(100), reason: Some(Reason::Fracto) };
        assert!(!d.should_beacon_now(50));
        assert!(d.should_beacon_now(101));
    }
}
