//! Packet Ingest — turns one deframed KISS payload into cache updates and
//! display pushes.

use log::{debug, warn};

use crate::aprs_text;
use crate::cache::merge_into;
use crate::context::AppState;
use crate::display;

/// Handle one already-deframed KISS payload (raw AX.25-as-text bytes).
pub fn handle_kiss_frame(state: &mut AppState, payload: &[u8]) {
    let text = match std::str::from_utf8(payload) {
        Ok(t) => t,
        Err(_) => {
            warn!("dropping non-UTF8 KISS payload ({} bytes)", payload.len());
            return;
        }
    };

    let mut packet = match aprs_text::decode(text) {
        Ok(p) => p,
        Err(e) => {
            debug!("dropping unparseable packet `{text}`: {e:?}");
            return;
        }
    };

    let is_own = packet.callsign == state.config.station.mycall;
    if is_own {
        state.digipeat.on_heard_self();
        if let Some(own) = state.last_own_packet.as_mut() {
            merge_into(&mut packet, own);
        }
    }

    let fix = state.current_fix();
    let is_new = state.cache.last_distinct().map(|p| p.callsign.as_str()) != Some(packet.callsign.as_str());
    display::display_packet(&state.display, &packet, &state.config.station.mycall, &fix, is_new);

    if !is_own {
        state.cache.insert(packet);
    }

    display::update_packets_ui(&state.display, &state.cache.iterate_recent().cloned().collect::<Vec<_>>(), &state.config.station.mycall, &fix);
    state.display.send("I_RX", "1");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::DisplaySink;
    use std::path::Path;

    fn state() -> AppState {
        let mut cfg = Config::default();
        cfg.station.mycall = "N0CAL-7".into();
        let sink = DisplaySink::unix(Path::new("/tmp/aprs-ingest-test.sock")).unwrap();
        AppState::new(cfg, sink)
    }

    #[test]
    fn unparseable_payload_is_dropped_without_panic() {
        let mut st = state();
        handle_kiss_frame(&mut st, b"not-a-packet");
        assert!(st.cache.is_empty());
    }

    #[test]
    fn third_party_packet_is_cached() {
        let mut st = state();
        handle_kiss_frame(&mut st, b"K1ABC>APZDMS,WIDE1-1:!3707.41N/12232.59W>hi");
        assert_eq!(st.cache.len(), 1);
    }

    #[test]
    fn own_callsign_echo_is_not_cached_but_sets_digipeat_bit() {
        let mut st = state();
        handle_kiss_frame(&mut st, b"N0CAL-7>APZDMS,WIDE1-1*:!3707.41N/12232.59W>hi");
        assert!(st.cache.is_empty());
        assert_eq!(st.digipeat.sig_bars(), 0); // one bit set / 2 == 0, but no panic/crash
    }
}
