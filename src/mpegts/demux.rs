//! # Synchronization demuxer
//!
//! Watches the start of a live MPEG-TS stream on behalf of a single
//! subscriber and produces the minimal "init prefix" — PAT, PMT(s), and a
//! synthetic PES per elementary stream carrying its parameter sets — that
//! lets a late joiner start decoding cleanly, without buffering or
//! re-transmitting anything beyond those few packets.
//!
//! Grounded on `examples/original_source/relay/demuxer.go`'s
//! `DetermineTransport`/`Demuxer.FindInit` for the overall shape (detect
//! transport once, then delegate to a parser that accumulates state until it
//! can produce init data) and on `examples/original_source/mpegts/{parser,h264,h265}.go`
//! for the exact PAT → PMT → codec-init ordering used as the authoritative
//! fixture in spec scenario 7 (20 init packets for a `h264.ts` capture).

use bytes::Bytes;
use std::collections::HashMap;

use crate::error::Result;
use crate::mpegts::h264::H264Collector;
use crate::mpegts::h265::H265Collector;
use crate::mpegts::packet::{self, Packet, PACKET_LEN};
use crate::mpegts::pes;
use crate::mpegts::psi::{self, PatEntry, STREAM_TYPE_H264, STREAM_TYPE_H265};

/// What [`Demuxer::feed`] tells the caller to do with the buffer it just fed in.
pub enum FeedOutcome {
    /// Not yet ready; the buffer has been absorbed and should be discarded.
    Pending,
    /// The stream does not look like MPEG-TS at all. The caller should
    /// forward this buffer as-is and never consult the demuxer again.
    Bypass,
    /// Ready. These init packets should be written, in order, before
    /// switching the caller to plain pass-through (the triggering buffer
    /// itself is not forwarded — its bytes are already represented in the
    /// init packets above).
    Ready(Vec<Bytes>),
}

#[derive(Default)]
struct PatState {
    expected_section: u8,
    last_section: Option<u8>,
    entries: Vec<PatEntry>,
    raw_packets: Vec<Bytes>,
    complete: bool,
}

#[derive(Default)]
struct PmtState {
    expected_section: u8,
    last_section: Option<u8>,
    raw_packets: Vec<Bytes>,
    complete: bool,
}

enum Collector {
    H264(H264Collector),
    H265(H265Collector),
}

impl Collector {
    fn feed(&mut self, data: &[u8]) {
        match self {
            Collector::H264(c) => c.feed(data),
            Collector::H265(c) => c.feed(data),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Collector::H264(c) => c.is_ready(),
            Collector::H265(c) => c.is_ready(),
        }
    }

    fn init_payload(&self) -> Option<Vec<u8>> {
        match self {
            Collector::H264(c) => c.init_payload(),
            Collector::H265(c) => c.init_payload(),
        }
    }

    fn video_stream_id(&self) -> u8 {
        pes::VIDEO_STREAM_ID_MIN
    }
}

struct EsStream {
    collector: Collector,
    started: bool,
}

enum Transport {
    Unknown,
    MpegTs,
    Opaque,
}

/// Per-subscriber synchronization state machine.
pub struct Demuxer {
    transport: Transport,
    pat: PatState,
    pmt_pids: HashMap<u16, ()>, // PMT-carrying PIDs discovered from the PAT
    pmts: HashMap<u16, PmtState>,
    es_streams: HashMap<u16, EsStream>,
    ready: bool,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer {
    /// Creates a fresh demuxer with no accumulated state.
    pub fn new() -> Self {
        Demuxer {
            transport: Transport::Unknown,
            pat: PatState::default(),
            pmt_pids: HashMap::new(),
            pmts: HashMap::new(),
            es_streams: HashMap::new(),
            ready: false,
        }
    }

    /// Feeds one buffer of bytes as received from the publisher.
    pub fn feed(&mut self, data: &[u8]) -> Result<FeedOutcome> {
        if self.ready {
            return Ok(FeedOutcome::Pending);
        }

        if matches!(self.transport, Transport::Unknown) {
            if data.len() >= PACKET_LEN && data[0] == packet::SYNC_BYTE {
                self.transport = Transport::MpegTs;
            } else {
                self.transport = Transport::Opaque;
            }
        }

        if matches!(self.transport, Transport::Opaque) {
            return Ok(FeedOutcome::Bypass);
        }

        let packet_count = data.len() / PACKET_LEN;
        for i in 0..packet_count {
            let raw = &data[i * PACKET_LEN..(i + 1) * PACKET_LEN];
            self.process_packet(raw)?;
        }

        if self.is_ready() {
            self.ready = true;
            return Ok(FeedOutcome::Ready(self.build_init_packets()));
        }

        Ok(FeedOutcome::Pending)
    }

    fn process_packet(&mut self, raw: &[u8]) -> Result<()> {
        let pkt = Packet::parse(raw)?;
        let pid = pkt.header.pid;

        if pid == 0x0000 {
            if pkt.header.pusi {
                if let Some(payload) = pkt.payload {
                    self.handle_pat(payload, raw)?;
                }
            }
            return Ok(());
        }

        if self.pmt_pids.contains_key(&pid) {
            if pkt.header.pusi {
                if let Some(payload) = pkt.payload {
                    self.handle_pmt(pid, payload, raw)?;
                }
            }
            return Ok(());
        }

        if self.es_streams.contains_key(&pid) {
            if let Some(payload) = pkt.payload {
                self.handle_es(pid, pkt.header.pusi, payload);
            }
        }

        Ok(())
    }

    fn handle_pat(&mut self, payload: &[u8], raw: &[u8]) -> Result<()> {
        if self.pat.complete {
            return Ok(());
        }
        let section_bytes = psi::strip_pointer_field(payload)?;
        let section = psi::parse_pat(section_bytes)?;

        if section.section_number != self.pat.expected_section {
            return Ok(()); // out of order; ignored until the expected one arrives
        }

        for entry in &section.entries {
            if entry.program_number != 0 {
                self.pmt_pids.insert(entry.pid, ());
                self.pmts.entry(entry.pid).or_default();
            }
        }
        self.pat.entries.extend(section.entries);
        self.pat.raw_packets.push(Bytes::copy_from_slice(raw));
        self.pat.expected_section += 1;
        self.pat.last_section = Some(section.last_section_number);

        if self.pat.expected_section > section.last_section_number {
            self.pat.complete = true;
        }

        Ok(())
    }

    fn handle_pmt(&mut self, pid: u16, payload: &[u8], raw: &[u8]) -> Result<()> {
        if self.pmts.get(&pid).map(|p| p.complete).unwrap_or(false) {
            return Ok(());
        }

        let section_bytes = psi::strip_pointer_field(payload)?;
        let section = psi::parse_pmt(section_bytes)?;

        let state = self.pmts.entry(pid).or_default();
        if section.section_number != state.expected_section {
            return Ok(());
        }

        for stream in &section.streams {
            let collector = match stream.stream_type {
                STREAM_TYPE_H264 => Some(Collector::H264(H264Collector::new())),
                STREAM_TYPE_H265 => Some(Collector::H265(H265Collector::new())),
                _ => None,
            };
            if let Some(collector) = collector {
                self.es_streams
                    .entry(stream.elementary_pid)
                    .or_insert(EsStream {
                        collector,
                        started: false,
                    });
            }
        }

        let state = self.pmts.entry(pid).or_default();
        state.raw_packets.push(Bytes::copy_from_slice(raw));
        state.expected_section += 1;
        state.last_section = Some(section.last_section_number);
        if state.expected_section > section.last_section_number {
            state.complete = true;
        }

        Ok(())
    }

    fn handle_es(&mut self, pid: u16, pusi: bool, payload: &[u8]) {
        let stream = self.es_streams.get_mut(&pid).unwrap();
        if stream.collector.is_ready() {
            return;
        }

        if pusi {
            match pes::parse_pes_start(payload) {
                Some((stream_id, offset)) if pes::is_video_stream_id(stream_id) => {
                    stream.started = true;
                    stream.collector.feed(&payload[offset..]);
                }
                Some(_) => {
                    // non-video PES on a tracked PID; ignore
                }
                None => {
                    // PES header truncated by the packet boundary; parsing
                    // continues once more bytes arrive.
                }
            }
            return;
        }

        if stream.started {
            stream.collector.feed(payload);
        }
    }

    fn is_ready(&self) -> bool {
        self.pat.complete
            && !self.pmts.is_empty()
            && self.pmts.values().all(|p| p.complete)
            && !self.es_streams.is_empty()
            && self.es_streams.values().all(|e| e.collector.is_ready())
    }

    fn build_init_packets(&self) -> Vec<Bytes> {
        let mut out = Vec::new();
        out.extend(self.pat.raw_packets.iter().cloned());
        for state in self.pmts.values() {
            out.extend(state.raw_packets.iter().cloned());
        }
        for (pid, stream) in &self.es_streams {
            if let Some(payload) = stream.collector.init_payload() {
                let pes = pes::build_minimal_pes(stream.collector.video_stream_id(), &payload);
                for (i, chunk) in pes.chunks(PACKET_LEN - 4).enumerate() {
                    if let Ok(raw) = packet::assemble(*pid, i == 0, chunk) {
                        out.push(Bytes::copy_from_slice(&raw));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crc::Crc32Mpeg2;

    const PMT_PID: u16 = 0x1000;
    const ES_PID: u16 = 0x0101;

    fn pat_packet() -> Bytes {
        let mut section = vec![
            psi::TABLE_ID_PAT,
            0x00,
            0x00,
            0x00,
            0x01,
            0xC1,
            0x00,
            0x00,
        ];
        section.extend_from_slice(&1u16.to_be_bytes());
        section.extend_from_slice(&(PMT_PID | 0xE000).to_be_bytes());
        let section_length = (section.len() - 3) + 4;
        section[1] = 0xB0 | ((section_length >> 8) as u8 & 0x0f);
        section[2] = (section_length & 0xff) as u8;
        let crc = Crc32Mpeg2::new().calculate(&section);
        section.extend_from_slice(&crc.to_be_bytes());

        let mut payload = vec![0x00]; // pointer field
        payload.extend_from_slice(&section);
        Bytes::copy_from_slice(&packet::assemble(0x0000, true, &payload).unwrap())
    }

    fn pmt_packet() -> Bytes {
        let mut section = vec![
            psi::TABLE_ID_PMT,
            0x00,
            0x00,
            0x00,
            0x01,
            0xC1,
            0x00,
            0x00,
        ];
        section.extend_from_slice(&(ES_PID | 0xE000).to_be_bytes());
        section.extend_from_slice(&[0xF0, 0x00]);
        section.push(STREAM_TYPE_H264);
        section.extend_from_slice(&(ES_PID | 0xE000).to_be_bytes());
        section.extend_from_slice(&[0xF0, 0x00]);
        let section_length = (section.len() - 3) + 4;
        section[1] = 0xB0 | ((section_length >> 8) as u8 & 0x0f);
        section[2] = (section_length & 0xff) as u8;
        let crc = Crc32Mpeg2::new().calculate(&section);
        section.extend_from_slice(&crc.to_be_bytes());

        let mut payload = vec![0x00];
        payload.extend_from_slice(&section);
        Bytes::copy_from_slice(&packet::assemble(PMT_PID, true, &payload).unwrap())
    }

    fn es_packet(pusi: bool, payload: &[u8]) -> Bytes {
        Bytes::copy_from_slice(&packet::assemble(ES_PID, pusi, payload).unwrap())
    }

    #[test]
    fn produces_init_packets_once_pat_pmt_and_sps_pps_seen() {
        let mut demux = Demuxer::new();

        let mut buf = Vec::new();
        buf.extend_from_slice(&pat_packet());
        buf.extend_from_slice(&pmt_packet());
        match demux.feed(&buf).unwrap() {
            FeedOutcome::Pending => {}
            _ => panic!("expected pending before codec init"),
        }

        let pes = pes::build_minimal_pes(
            0xE0,
            &[0x00, 0x00, 0x01, 0x07, 0xAA, 0x00, 0x00, 0x01, 0x08, 0xBB],
        );
        let es = es_packet(true, &pes);
        match demux.feed(&es).unwrap() {
            FeedOutcome::Ready(packets) => {
                assert!(!packets.is_empty());
                // PAT first, then PMT, then the synthetic ES init packet(s).
                assert_eq!(packets[0], pat_packet());
                assert_eq!(packets[1], pmt_packet());
            }
            FeedOutcome::Pending => panic!("expected ready after sps/pps observed"),
            FeedOutcome::Bypass => panic!("should not bypass a valid TS stream"),
        }
    }

    #[test]
    fn non_ts_data_bypasses_sync_entirely() {
        let mut demux = Demuxer::new();
        let data = b"not an mpeg-ts stream at all, just opaque bytes";
        match demux.feed(data).unwrap() {
            FeedOutcome::Bypass => {}
            _ => panic!("expected bypass for non-TS data"),
        }
    }

    #[test]
    fn rejects_invalid_sync_byte_mid_stream() {
        let mut demux = Demuxer::new();
        let mut buf = pat_packet().to_vec();
        buf[0] = 0x00; // corrupt sync byte, but len still looks like TS overall
        // Force transport detection to MpegTs first with a valid packet, then feed bad one.
        let good = pat_packet();
        demux.feed(&good).unwrap();
        assert!(demux.feed(&buf).is_err());
    }
}
