//! The station's single cooperative event loop. Three serial sources
//! (TNC, GPS, telemetry) are fed in by dedicated `spawn_blocking` reader
//! tasks over channels; this loop multiplexes them with a 1-second tick
//! in a fixed priority order — TNC first, then GPS, then telemetry, then
//! the tick — mirroring the original's `select()` call order, which
//! always drained the TNC descriptor before the others in the same pass.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::context::AppState;
use crate::kiss;
use crate::nmea;
use crate::position::Fix;
use crate::{display, ingest, scheduler};

/// Inbound channels the loop polls. `None` on any channel means that
/// source isn't configured (e.g. no telemetry radio attached); a closed
/// channel is treated the same way going forward.
pub struct Inputs {
    pub tnc_rx: mpsc::Receiver<Vec<u8>>,
    pub gps_rx: Option<mpsc::Receiver<String>>,
    pub tel_rx: Option<mpsc::Receiver<String>>,
    pub tnc_tx: mpsc::UnboundedSender<Vec<u8>>,
}

/// Drive the station forever. Returns only if every input channel closes
/// (the reader tasks all exited), which the caller treats as fatal.
pub async fn run(mut state: AppState, mut inputs: Inputs) {
    let mut deframer = kiss::Deframer::new();
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut gps_closed = inputs.gps_rx.is_none();
    let mut tel_closed = inputs.tel_rx.is_none();

    loop {
        tokio::select! {
            biased;

            maybe_bytes = inputs.tnc_rx.recv() => {
                match maybe_bytes {
                    Some(bytes) => {
                        for frame in deframer.push_bytes(&bytes) {
                            ingest::handle_kiss_frame(&mut state, &frame);
                        }
                    }
                    None => {
                        warn!("TNC reader task exited; station cannot transmit or receive");
                        return;
                    }
                }
            }

            maybe_line = recv_optional(&mut inputs.gps_rx), if !gps_closed => {
                match maybe_line {
                    Some(line) => handle_gps_line(&mut state, &line),
                    None => {
                        debug!("GPS reader task exited");
                        gps_closed = true;
                    }
                }
            }

            maybe_line = recv_optional(&mut inputs.tel_rx), if !tel_closed => {
                match maybe_line {
                    Some(line) => handle_telemetry_line(&mut state, &line),
                    None => {
                        debug!("telemetry reader task exited");
                        tel_closed = true;
                    }
                }
            }

            _ = tick.tick() => {
                on_tick(&mut state, &inputs.tnc_tx);
            }
        }
    }
}

/// Adapts an `Option<Receiver<T>>` into something `select!` can poll: a
/// `None` channel simply never resolves (its branch is disabled by the
/// `if !*_closed` guard instead).
async fn recv_optional<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn handle_gps_line(state: &mut AppState, line: &str) {
    let sentence = match nmea::parse_sentence(line) {
        Some(s) => s,
        None => {
            debug!("dropping unrecognized or bad-checksum NMEA line: {line}");
            return;
        }
    };
    if nmea::apply_sentence(&mut state.position, sentence) {
        state.last_gps_data = crate::util::now();
        let fix = state.current_fix();
        if fix.speed_kt > 0.0 {
            state.last_moving = Some(crate::util::now());
        }
    }
}

fn handle_telemetry_line(state: &mut AppState, line: &str) {
    let Some((key, value)) = line.split_once('=') else {
        warn!("malformed telemetry line: {line}");
        return;
    };
    if !state.telemetry.apply(key.trim(), value.trim()) {
        warn!("unrecognized telemetry key: {key}");
    }
}

/// Synthesize a fix from the `[static]` config section instead of reading
/// a real GPS — used for bench testing without hardware attached. Under
/// `--testing`, the course drifts by +0.1 deg/tick so SmartBeaconing's
/// course-change check has something to exercise without real motion.
fn fake_gps_data(state: &mut AppState) {
    let s = state.config.static_gps;
    if state.testing {
        state.course_drift += 0.1;
    }
    let fix = crate::position::Fix {
        lat: s.lat,
        lon: s.lon,
        alt_ft: s.alt,
        speed_kt: s.speed,
        course_deg: s.course + state.course_drift,
        qual: 1,
        sats: 6,
        tstamp: 0,
        dstamp: 0,
    };
    state.position.set_current(fix);
    state.last_gps_data = crate::util::now();
}

/// Opportunistically set the host clock from a locked GPS fix, the way
/// the original shells out to `date -u` once per 120s. Fire-and-forget:
/// spawned as its own task so a hung or missing `date` binary never
/// stalls the event loop.
fn spawn_set_clock(fix: &Fix) {
    let hour = fix.tstamp / 10000;
    let min = (fix.tstamp / 100) % 100;
    let sec = fix.tstamp % 100;
    let day = fix.dstamp / 10000;
    let mon = (fix.dstamp / 100) % 100;
    let year = fix.dstamp % 100;
    let timestr = format!("{mon:02}{day:02}{hour:02}{min:02}20{year:02}.{sec:02}");

    tokio::spawn(async move {
        match Command::new("date").arg("-u").arg(&timestr).status().await {
            Ok(s) if s.success() => info!("set host clock via `date -u {timestr}`"),
            Ok(s) => warn!("`date -u {timestr}` exited {s}"),
            Err(e) => warn!("failed to run `date -u {timestr}`: {e}"),
        }
    });
}

fn on_tick(state: &mut AppState, tnc_tx: &mpsc::UnboundedSender<Vec<u8>>) {
    if state.config.gps_type == crate::config::GpsType::Static {
        fake_gps_data(state);
    }
    let fix = state.current_fix();
    let mycall = state.config.station.mycall.clone();
    display::display_gps_info(&state.display, &mycall, &fix);
    display::display_beacon_status(&state.display, state.last_tx, state.digipeat.sig_bars());

    if fix.eligible_for_time_set() && crate::util::has_been(state.last_time_set, 120) {
        spawn_set_clock(&fix);
        state.last_time_set = crate::util::now();
    }

    let recent: Vec<_> = state.cache.iterate_recent().cloned().collect();
    display::update_packets_ui(&state.display, &recent, &mycall, &fix);

    if let Some(packets) = scheduler::maybe_beacon(state) {
        for packet in packets {
            let framed = kiss::frame(packet.as_bytes());
            if tnc_tx.send(framed).is_err() {
                warn!("TNC writer task gone; dropping outbound beacon");
            }
        }
    }
}
