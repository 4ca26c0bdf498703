//! # H.265 parameter-set collection
//!
//! Same role as [`crate::mpegts::h264`] for HEVC streams, which carry three
//! parameter sets (VPS/SPS/PPS) instead of two, and a 2-byte NAL header.
//! Grounded on `examples/original_source/mpegts/h265.go`'s `ContainsInit`
//! (`(buf[i] >> 1) & 0x3F` NAL type extraction).

use super::h264::find_start_codes;

/// NAL unit type for a Video Parameter Set.
pub const NAL_TYPE_VPS: u8 = 32;
/// NAL unit type for a Sequence Parameter Set.
pub const NAL_TYPE_SPS: u8 = 33;
/// NAL unit type for a Picture Parameter Set.
pub const NAL_TYPE_PPS: u8 = 34;

/// Accumulates VPS, SPS and PPS NAL units out of a live H.265 elementary stream.
#[derive(Debug, Default)]
pub struct H265Collector {
    buffer: Vec<u8>,
    vps: Option<Vec<u8>>,
    sps: Option<Vec<u8>>,
    pps: Option<Vec<u8>>,
}

impl H265Collector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds more elementary-stream bytes. A no-op once [`is_ready`](Self::is_ready).
    pub fn feed(&mut self, data: &[u8]) {
        if self.is_ready() {
            return;
        }
        self.buffer.extend_from_slice(data);
        self.scan();
    }

    fn scan(&mut self) {
        let starts = find_start_codes(&self.buffer);
        for window in starts.windows(2) {
            let (start, end) = (window[0], window[1]);
            let header_pos = start.pos + start.code_len;
            if header_pos >= self.buffer.len() {
                continue;
            }
            let header_byte = self.buffer[header_pos];
            let forbidden_zero_bit = header_byte & 0x80 != 0;
            if forbidden_zero_bit {
                continue;
            }
            let nal_type = (header_byte >> 1) & 0x3f;
            let raw = &self.buffer[start.pos..end.pos];
            match nal_type {
                NAL_TYPE_VPS => self.vps = Some(raw.to_vec()),
                NAL_TYPE_SPS => self.sps = Some(raw.to_vec()),
                NAL_TYPE_PPS => self.pps = Some(raw.to_vec()),
                _ => {}
            }
        }
    }

    /// Whether VPS, SPS and PPS have all been captured.
    pub fn is_ready(&self) -> bool {
        self.vps.is_some() && self.sps.is_some() && self.pps.is_some()
    }

    /// The concatenated VPS+SPS+PPS bytes (including start codes), ready to
    /// be wrapped in a synthetic PES packet. `None` until ready.
    pub fn init_payload(&self) -> Option<Vec<u8>> {
        if !self.is_ready() {
            return None;
        }
        let mut out = Vec::new();
        out.extend_from_slice(self.vps.as_ref()?);
        out.extend_from_slice(self.sps.as_ref()?);
        out.extend_from_slice(self.pps.as_ref()?);
        Some(out)
    }
}
