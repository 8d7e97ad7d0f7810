//! KISS framing — the host-to-TNC byte protocol (frame-end/frame-escape
//! byte stuffing). Only command 0x00 (data frame) is produced or
//! consumed; other KISS commands (persistence, slot time, ...) are out of
//! scope for a single-TNC station.

const FEND: u8 = 0xC0;
const FESC: u8 = 0xDB;
const TFEND: u8 = 0xDC;
const TFESC: u8 = 0xDD;
const CMD_DATA: u8 = 0x00;

/// Wrap `payload` (an AX.25 frame, without the KISS command byte) in a
/// complete KISS data frame ready to write to the TNC.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.push(FEND);
    out.push(CMD_DATA);
    for &b in payload {
        match b {
            FEND => {
                out.push(FESC);
                out.push(TFEND);
            }
            FESC => {
                out.push(FESC);
                out.push(TFESC);
            }
            _ => out.push(b),
        }
    }
    out.push(FEND);
    out
}

/// Incremental KISS deframer: feed it raw bytes as they arrive from the
/// serial port, get back complete data-frame payloads as they close.
#[derive(Debug, Default)]
pub struct Deframer {
    buf: Vec<u8>,
    in_frame: bool,
    escaped: bool,
}

impl Deframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns `Some(payload)` if it completed a data
    /// frame (command-byte stripped). Frames carrying a non-data command
    /// byte are silently dropped.
    pub fn push_byte(&mut self, byte: u8) -> Option<Vec<u8>> {
        if byte == FEND {
            let finished = if self.in_frame && !self.buf.is_empty() {
                let cmd = self.buf[0];
                let payload = self.buf[1..].to_vec();
                (cmd == CMD_DATA).then_some(payload)
            } else {
                None
            };
            self.buf.clear();
            self.in_frame = true;
            self.escaped = false;
            return finished;
        }

        if !self.in_frame {
            return None;
        }

        if self.escaped {
            self.escaped = false;
            match byte {
                TFEND => self.buf.push(FEND),
                TFESC => self.buf.push(FESC),
                other => self.buf.push(other), // malformed escape: pass through
            }
        } else if byte == FESC {
            self.escaped = true;
        } else {
            self.buf.push(byte);
        }
        None
    }

    /// Feed a chunk of bytes, collecting every frame that completes within it.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes.iter().filter_map(|&b| self.push_byte(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_plain_payload() {
        let payload = b"N0CAL-7>APRS:!hello";
        let framed = frame(payload);
        let mut d = Deframer::new();
        let frames = d.push_bytes(&framed);
        assert_eq!(frames, vec![payload.to_vec()]);
    }

    #[test]
    fn escapes_fend_and_fesc_bytes_in_payload() {
        let payload = vec![0x01, FEND, 0x02, FESC, 0x03];
        let framed = frame(&payload);
        assert!(!framed[1..framed.len() - 1].contains(&FEND));
        let mut d = Deframer::new();
        let frames = d.push_bytes(&framed);
        assert_eq!(frames, vec![payload]);
    }

    #[test]
    fn non_data_command_is_dropped() {
        let mut d = Deframer::new();
        let raw = [FEND, 0x01, 0xAA, 0xBB, FEND];
        let frames = d.push_bytes(&raw);
        assert!(frames.is_empty());
    }

    #[test]
    fn back_to_back_frames_in_one_chunk() {
        let mut d = Deframer::new();
        let mut raw = frame(b"one");
        raw.extend(frame(b"two"));
        let frames = d.push_bytes(&raw);
        assert_eq!(frames, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn empty_frame_between_fends_yields_nothing() {
        let mut d = Deframer::new();
        let frames = d.push_bytes(&[FEND, FEND, FEND]);
        assert!(frames.is_empty());
    }
}
