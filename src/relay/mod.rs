//! # Relay core
//!
//! The publish/subscribe fan-out engine: a [`channel::Channel`] per active
//! stream, registered and looked up by name through [`registry::Relay`].

pub mod channel;
pub mod registry;

pub use channel::{Channel, ChannelStats, Release, Subscription};
pub use registry::{Relay, StreamStatistics};
