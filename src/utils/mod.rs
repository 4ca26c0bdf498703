//! # Utility Functions and Types
//!
//! Shared low-level helpers used by the MPEG-TS layer.
//!
//! ```rust
//! use srtrelay::utils::Crc32Mpeg2;
//!
//! let crc = Crc32Mpeg2::new();
//! let data = b"Hello, world!";
//! println!("CRC32: {:08x}", crc.calculate(data));
//! ```

/// CRC calculation implementations
pub mod crc;

pub use crc::Crc32Mpeg2;
