//! # Error Types
//!
//! This module provides the central error type for the relay core,
//! `RelayError`, and the `Result` alias used throughout the crate.
//!
//! ## Example Usage
//!
//! ```rust
//! use srtrelay::error::{Result, RelayError};
//!
//! fn validate_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(RelayError::MissingName);
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Primary error type for the relay core.
#[derive(Error, Debug)]
pub enum RelayError {
    /// I/O errors from the underlying packet socket or config file access.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream id did not match either accepted grammar.
    #[error("invalid stream id")]
    InvalidStreamId,

    /// The stream id's mode was neither `play`/`request` nor `publish`.
    #[error("invalid mode")]
    InvalidMode,

    /// The stream id parsed but carried an empty name.
    #[error("missing stream name")]
    MissingName,

    /// The key-value stream id grammar used a key outside the recognized set.
    #[error("unsupported stream id key: {0}")]
    UnsupportedKey(String),

    /// The authenticator denied the connection.
    #[error("unauthorized")]
    Unauthorized,

    /// A publisher claimed a name that is already in use.
    #[error("stream already exists")]
    StreamExists,

    /// A subscriber asked for a name with no active publisher.
    #[error("stream does not exist")]
    StreamNotFound,

    /// The publisher disconnected; the subscriber's channel has closed.
    #[error("upstream closed")]
    UpstreamClosed,

    /// A malformed MPEG-TS packet was encountered (bad sync byte, truncated header, ...).
    #[error("invalid mpeg-ts packet: {0}")]
    InvalidPacket(String),

    /// Encoding a synthetic TS packet would overflow the 188-byte payload budget.
    #[error("data too long for a single ts packet")]
    DataTooLong,

    /// The configuration file or its contents could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

/// A specialized `Result` type used throughout the relay core.
pub type Result<T> = std::result::Result<T, RelayError>;
