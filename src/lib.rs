#![doc(html_root_url = "https://docs.rs/srtrelay/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # srtrelay
//!
//! A live SRT ingest relay for MPEG-TS: one publisher, many subscribers,
//! addressed by stream id, with mid-stream synchronization so a subscriber
//! joining after the publisher started can still begin decoding cleanly.
//!
//! ## Module overview
//!
//! - [`stream_id`]: parses the legacy and key-value stream-id grammars and
//!   matches them against glob allowlists.
//! - [`auth`]: the `Authenticator` trait plus the static-allowlist and
//!   HTTP-backend implementations.
//! - [`mpegts`]: the transport-packet codec, PSI/PES parsing, H.264/H.265
//!   parameter-set collection, and the synchronization demuxer.
//! - [`relay`]: the fan-out `Channel` and the `Relay` registry mapping
//!   stream names to active channels.
//! - [`transport`]: the narrow `PacketSocket`/`PacketListener`/`ConnRequest`
//!   traits an SRT binding implements; this crate never binds a socket
//!   itself.
//! - [`session`]: the publish/play loops run once a connection is accepted.
//! - [`listener`]: the accept loop and per-connection dispatch tying
//!   authentication, sessions, and statistics together.
//! - [`config`]: configuration loading.
//! - [`api`]: the observability HTTP surface.
//! - [`error`]: the crate-wide `RelayError`/`Result`.

/// Authentication backends gating publish/play sessions.
pub mod auth;

/// Configuration loading.
pub mod config;

/// Error types and the crate-wide `Result` alias.
pub mod error;

/// The observability HTTP surface.
pub mod api;

/// The accept loop and per-connection dispatch.
pub mod listener;

/// MPEG-TS transport-stream handling and the synchronization demuxer.
pub mod mpegts;

/// The fan-out channel and stream registry.
pub mod relay;

/// Per-connection publish/play session loops.
pub mod session;

/// Stream identifier parsing and matching.
pub mod stream_id;

/// Abstract packet-transport traits.
pub mod transport;

/// Low-level shared utilities (CRC, etc.)
pub mod utils;

pub use error::{RelayError, Result};
