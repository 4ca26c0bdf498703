//! # MPEG-TS transport-stream handling
//!
//! A minimal, relay-focused subset of MPEG-TS: packet-level codec, PSI
//! section parsing, PES start detection, NAL parameter-set collection for
//! H.264/H.265, and the synchronization demuxer that ties them together to
//! produce a late-joiner init prefix. See [`demux::Demuxer`] for the entry
//! point.

pub mod demux;
pub mod h264;
pub mod h265;
pub mod packet;
pub mod pes;
pub mod psi;

pub use demux::{Demuxer, FeedOutcome};
pub use packet::{Packet, TsHeader, PACKET_LEN};
