//! Beacon Scheduler — throttles SmartBeaconing checks to twice a second,
//! picks plain vs MIC-E encoding by speed, and follows a MIC-E beacon
//! with a status packet every two minutes while moving fast.

use std::time::Duration;

use log::info;

use crate::aprs_text;
use crate::beacon;
use crate::context::AppState;
use crate::mice;
use crate::smartbeacon::{self, Outcome, Reason};
use crate::util::{format_time, now};

const CHECK_THROTTLE: Duration = Duration::from_millis(500);
const STATUS_FOLLOWUP_SECS: u64 = 120;
const MICE_SPEED_THRESHOLD_KT: f64 = 5.0;
const WX_FRESH_SECS: u64 = 30;

fn reason_label(reason: Reason) -> &'static str {
    match reason {
        Reason::NoData => "NODATA",
        Reason::NoLock => "NOLOCK",
        Reason::Stopped => "STOPPED",
        Reason::AtRest => "ATREST",
        Reason::Course => "COURSE",
        Reason::SlowTo => "SLOWTO",
        Reason::FastTo => "FASTTO",
        Reason::Fracto => "FRACTO",
    }
}

/// Returns the encoded beacon line(s) that should be handed to the TNC, or
/// nothing if it isn't time yet.
pub fn maybe_beacon(state: &mut AppState) -> Option<Vec<String>> {
    if state.last_beacon_check.elapsed() < CHECK_THROTTLE {
        return None;
    }
    state.last_beacon_check = std::time::Instant::now();

    let mut fix = state.current_fix();
    let since_last_beacon = now().saturating_sub(state.last_tx);
    let since_last_gps = now().saturating_sub(state.last_gps_data);

    let decision = smartbeacon::decide(
        &state.config.beaconing,
        &mut fix,
        since_last_beacon,
        since_last_gps,
        state.last_tx_course,
        &mut state.last_moving,
        now(),
    );
    state.position.set_current(fix);

    if let Some(reason) = decision.reason {
        let label = match decision.outcome {
            Outcome::After(secs) if secs > 0 => format!("Every {}", format_time(secs)),
            _ => reason_label(reason).to_string(),
        };
        state.display.send("G_REASON", &label);
    }

    if !decision.should_beacon_now(since_last_beacon) {
        return None;
    }

    let mycall = state.config.station.mycall.clone();
    let digi_path = state.config.station.digi_path.clone();
    let icon = (state.config.station.icon_table, state.config.station.icon_code);

    let mut packets = Vec::new();

    if fix.speed_kt > MICE_SPEED_THRESHOLD_KT {
        let packet = mice::encode(&mycall, &fix, &digi_path, icon);
        info!("sending MIC-E beacon: {packet}");
        packets.push(packet.clone());

        if now().saturating_sub(state.last_status) > STATUS_FOLLOWUP_SECS {
            let comment = next_comment(state);
            let status = beacon::encode_status(&mycall, &digi_path, &comment);
            info!("sending status follow-up: {status}");
            packets.push(status);
            state.last_status = now();
        }
    } else {
        let comment = next_comment(state);
        let telemetry_fresh = state.telemetry.is_fresh(WX_FRESH_SECS);
        let mut cursor = state.data_cursor;
        let selected = beacon::choose_data(
            &mut cursor,
            state.config.station.beacon_types,
            telemetry_fresh,
            state.telemetry.temp1,
            state.config.station.phg,
            comment,
        );
        state.data_cursor = cursor;
        let plain_icon = match selected.icon_code_override {
            Some(code) => (icon.0, code),
            None => icon,
        };
        let packet = beacon::encode_plain(&mycall, &fix, &digi_path, plain_icon, &selected.payload);
        info!("sending plain beacon: {packet}");
        packets.push(packet);
    }

    state.last_tx = now();
    state.last_tx_course = Some(fix.course_deg);
    state.digipeat.on_local_transmit();
    if let Some(last) = packets.last() {
        if let Ok(decoded) = aprs_text::decode(last) {
            state.last_own_packet = Some(decoded);
        }
    }

    crate::display::display_beacon_status(&state.display, state.last_tx, state.digipeat.sig_bars());
    state.display.send("I_TX", "1000");

    Some(packets)
}

fn next_comment(state: &mut AppState) -> String {
    let mycall = state.config.station.mycall.clone();
    let temp1 = state.telemetry.temp1;
    let voltage = state.telemetry.voltage;
    let fix = state.current_fix();
    state.comments.next_comment(|index| crate::comment::SubstContext {
        index,
        mycall,
        temp1,
        voltage,
        sats: fix.sats,
        version: env!("CARGO_PKG_VERSION").to_string(),
        time_hms: chrono::Local::now().format("%H:%M:%S").to_string(),
        date_mdy: chrono::Local::now().format("%m/%d/%Y").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::DisplaySink;
    use crate::position::Fix;
    use std::path::Path;

    fn state() -> AppState {
        let mut cfg = Config::default();
        cfg.comments = vec!["hi".into()];
        cfg.station.mycall = "N0CAL-7".into();
        let sink = DisplaySink::unix(Path::new("/tmp/aprs-scheduler-test.sock")).unwrap();
        let mut st = AppState::new(cfg, sink);
        st.last_beacon_check = std::time::Instant::now() - Duration::from_secs(1);
        st
    }

    #[test]
    fn no_lock_never_beacons() {
        let mut st = state();
        st.position.set_current(Fix { qual: 0, ..Default::default() });
        assert!(maybe_beacon(&mut st).is_none());
    }

    #[test]
    fn throttle_blocks_immediate_recheck() {
        let mut st = state();
        st.position.set_current(Fix { qual: 1, sats: 5, speed_kt: 0.0, ..Default::default() });
        st.last_gps_data = now();
        let _ = maybe_beacon(&mut st);
        assert!(maybe_beacon(&mut st).is_none());
    }

    #[test]
    fn fast_speed_uses_mice_encoding() {
        let mut st = state();
        st.position.set_current(Fix { qual: 1, sats: 5, speed_kt: 40.0, course_deg: 90.0, lat: 45.0, lon: -120.0, ..Default::default() });
        st.last_gps_data = now();
        st.last_tx = 0; // never beaconed -> has_been(0, n) is trivially true upstream, but here since_last_beacon uses now()-0 which is huge
        let packets = maybe_beacon(&mut st).expect("should beacon");
        assert!(packets[0].contains("`"));
    }
}
