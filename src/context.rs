//! Application state — every mutable store the event loop threads through
//! a single owned struct, rather than passing a dozen separate arguments
//! into each handler. Not `Send`-shared: the event loop owns this
//! directly and runs as one logical task.

use std::path::PathBuf;

use crate::cache::{DigipeatQuality, HeardCache};
use crate::comment::CommentRoster;
use crate::config::Config;
use crate::display::DisplaySink;
use crate::position::{Fix, PositionStore};
use crate::telemetry::TelemetryStore;

pub struct AppState {
    pub config: Config,
    pub position: PositionStore,
    pub telemetry: TelemetryStore,
    pub cache: HeardCache,
    pub digipeat: DigipeatQuality,
    pub comments: CommentRoster,
    pub display: DisplaySink,

    /// Unix timestamp of the last local transmission (position or status).
    pub last_tx: u64,
    /// Course at the last local transmission, for the SmartBeaconing
    /// course-change check. Seeded to `Some(0.0)` rather than `None`,
    /// matching the original's zero-initialized `state->last_beacon_pos`
    /// — the very first SmartBeaconing check after achieving a lock
    /// compares against a real (zero) course and can fire `COURSE`
    /// immediately, rather than silently skipping the check until after
    /// the first beacon.
    pub last_tx_course: Option<f64>,
    /// The most recent packet this station itself transmitted, kept
    /// around so a heard-back echo of it can merge in fields the
    /// repeater path stripped (digipeat "used" markers, mostly).
    pub last_own_packet: Option<crate::cache::HeardPacket>,
    /// Cursor into the WX/PHG/NONE beacon-data rotation.
    pub data_cursor: u32,
    /// Whether the last local transmission was a status beacon (used to
    /// decide when the 120-second status follow-up is next due).
    pub last_tx_was_status: bool,
    pub last_time_set: u64,
    pub log_path: PathBuf,

    /// Unix timestamp of the last successfully parsed GPS sentence; the
    /// SmartBeaconing NODATA branch fires once this goes stale.
    pub last_gps_data: u64,
    /// Set to `now()` whenever the fix shows nonzero speed, cleared by
    /// the SmartBeaconing STOPPED branch once it fires.
    pub last_moving: Option<u64>,
    /// Unix timestamp of the last status-beacon follow-up.
    pub last_status: u64,
    /// Throttles `maybe_beacon` to at most one SmartBeaconing check per
    /// half second.
    pub last_beacon_check: std::time::Instant,

    /// Set from `--testing`. Gates the synthetic-GPS course drift applied
    /// each tick in `eventloop::fake_gps_data`.
    pub testing: bool,
    /// Accumulated course drift added to `static_gps.course` each tick
    /// while `testing` is set, mirroring the original's `static_crs +=
    /// 0.1` per-tick perturbation.
    pub course_drift: f64,
}

impl AppState {
    pub fn new(config: Config, display: DisplaySink) -> Self {
        let comments = CommentRoster::new(config.comments.clone());
        let log_path = config.log_file.clone();
        Self {
            config,
            position: PositionStore::new(),
            telemetry: TelemetryStore::new(),
            cache: HeardCache::new(),
            digipeat: DigipeatQuality::new(),
            comments,
            display,
            last_tx: 0,
            last_tx_course: Some(0.0),
            last_own_packet: None,
            data_cursor: 0,
            last_tx_was_status: false,
            last_time_set: 0,
            log_path,
            last_gps_data: 0,
            last_moving: None,
            last_status: 0,
            last_beacon_check: std::time::Instant::now(),
            testing: false,
            course_drift: 0.0,
        }
    }

    pub fn current_fix(&self) -> Fix {
        self.position.current()
    }
}
