//! Heard-Station Cache — a bounded, merge-on-reinsert FIFO of recently
//! decoded inbound packets, plus the own-station digipeat-quality bitmap.

use std::collections::VecDeque;

const CAPACITY: usize = 8;

/// One hop of a packet's digipeater path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHop {
    pub name: String,
    /// True if this hop bears the "used" (`*`) marker.
    pub used: bool,
}

/// A decoded weather report, as surfaced by the inbound APRS decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WxReport {
    pub wind_dir_deg: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    pub wind_gust_mph: Option<f64>,
    pub temp_f: Option<f64>,
    pub rain_1h_in: Option<f64>,
    pub rain_24h_in: Option<f64>,
    pub humidity_pct: Option<u8>,
}

/// A decoded telemetry report. The wire format carries five analog values
/// and a digital byte; the station only ever surfaces its presence to the
/// display (see `display::render_telemetry`), so the fields are kept but
/// otherwise unexamined.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryReport {
    pub sequence: Option<u16>,
}

/// A decoded inbound APRS packet, as surfaced by the text decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeardPacket {
    pub callsign: String,
    pub path: Vec<PathHop>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt_ft: Option<f64>,
    pub speed_kt: Option<f64>,
    pub course_deg: Option<f64>,
    pub symbol_table: Option<char>,
    pub symbol_code: Option<char>,
    pub comment: Option<String>,
    pub status: Option<String>,
    pub wx: Option<WxReport>,
    pub telemetry: Option<TelemetryReport>,
    pub phg: Option<String>,
}

/// Move every optional field that `new` is missing in from `old`,
/// emptying `old`'s copy so double-freeing (or, here, double-counting) is
/// impossible. Second application of `merge_into` on an already-drained
/// `old` is a no-op, since every `.take()` on an already-`None` field is a
/// no-op.
pub fn merge_into(new: &mut HeardPacket, old: &mut HeardPacket) {
    if new.speed_kt.is_none() {
        new.speed_kt = old.speed_kt.take();
    }
    if new.course_deg.is_none() {
        new.course_deg = old.course_deg.take();
    }
    if new.lat.is_none() {
        new.lat = old.lat.take();
    }
    if new.lon.is_none() {
        new.lon = old.lon.take();
    }
    if new.alt_ft.is_none() {
        new.alt_ft = old.alt_ft.take();
    }
    if new.symbol_table.is_none() {
        new.symbol_table = old.symbol_table.take();
    }
    if new.symbol_code.is_none() {
        new.symbol_code = old.symbol_code.take();
    }
    if new.comment.is_none() {
        new.comment = old.comment.take();
    }
    if new.status.is_none() {
        new.status = old.status.take();
    }
}

/// Bounded FIFO of up to [`CAPACITY`] heard packets, keyed by source
/// callsign. Oldest entry is at the front, most recently heard at the
/// back. Re-insertion of a known callsign removes the old entry (merging
/// its fields into the new one first) which naturally closes the hole and
/// leaves chronological order over the remaining entries intact, then
/// appends the (possibly merged) new entry at the back.
#[derive(Debug, Clone, Default)]
pub struct HeardCache {
    entries: VecDeque<HeardPacket>,
}

impl HeardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut packet: HeardPacket) {
        if let Some(pos) = self.entries.iter().position(|e| e.callsign == packet.callsign) {
            let mut old = self.entries.remove(pos).expect("position just found");
            merge_into(&mut packet, &mut old);
        } else if self.entries.len() >= CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(packet);
    }

    /// Oldest-to-newest iteration.
    pub fn iterate_recent(&self) -> impl DoubleEndedIterator<Item = &HeardPacket> {
        self.entries.iter()
    }

    /// The most recently heard distinct station, if any.
    pub fn last_distinct(&self) -> Option<&HeardPacket> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Own-station digipeat-quality shift register: each local transmission
/// shifts in a 0, each inbound echo of our own callsign sets the LSB.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigipeatQuality(u8);

impl DigipeatQuality {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn on_local_transmit(&mut self) {
        self.0 <<= 1;
    }

    pub fn on_heard_self(&mut self) {
        self.0 |= 1;
    }

    /// Population count divided by two: a 0-4 "signal bars" display value.
    pub fn sig_bars(&self) -> u32 {
        self.0.count_ones() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(call: &str) -> HeardPacket {
        HeardPacket {
            callsign: call.into(),
            ..Default::default()
        }
    }

    #[test]
    fn bounded_to_capacity() {
        let mut cache = HeardCache::new();
        for i in 0..12 {
            cache.insert(packet(&format!("N{i}CALL")));
        }
        assert_eq!(cache.len(), CAPACITY);
    }

    #[test]
    fn reinsert_same_callsign_has_one_entry() {
        let mut cache = HeardCache::new();
        cache.insert(packet("N0CAL"));
        cache.insert(packet("N0CAL"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn merge_fills_gaps_and_moves_station_to_newest() {
        let mut cache = HeardCache::new();
        cache.insert(packet("A")); // original A carries a symbol
        if let Some(a) = cache.entries.front_mut() {
            a.symbol_table = Some('/');
            a.symbol_code = Some('>');
        }
        cache.insert(packet("B"));
        cache.insert(packet("C"));

        // Updated A with new position but no symbol
        let mut a2 = packet("A");
        a2.lat = Some(1.0);
        cache.insert(a2);

        let order: Vec<&str> = cache.iterate_recent().map(|p| p.callsign.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
        let merged_a = cache.last_distinct().unwrap();
        assert_eq!(merged_a.lat, Some(1.0));
        assert_eq!(merged_a.symbol_table, Some('/'));
        assert_eq!(merged_a.symbol_code, Some('>'));
    }

    #[test]
    fn double_merge_is_idempotent() {
        let mut new = packet("A");
        let mut old = packet("A");
        old.comment = Some("hi".into());
        merge_into(&mut new, &mut old);
        assert_eq!(new.comment, Some("hi".into()));
        assert_eq!(old.comment, None);

        // merge(merge(new, old), old) == merge(new, old): re-merging with
        // the now-drained old is a no-op.
        let before = new.clone();
        merge_into(&mut new, &mut old);
        assert_eq!(new, before);
    }

    #[test]
    fn digipeat_quality_bars() {
        let mut q = DigipeatQuality::new();
        for _ in 0..8 {
            q.on_heard_self();
            q.on_local_transmit();
        }
        // After 8 cycles of (heard, shift) the register is all zero again.
        assert_eq!(q.sig_bars(), 0);

        let mut q = DigipeatQuality::new();
        q.on_heard_self();
        assert_eq!(q.sig_bars(), 0); // 1 bit set / 2 == 0
        q.on_heard_self(); // no-op, LSB already set
        q.on_local_transmit();
        q.on_heard_self();
        assert_eq!(q.sig_bars(), 1); // two bits set
    }
}
