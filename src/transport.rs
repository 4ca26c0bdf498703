//! # Transport abstraction
//!
//! The relay core never binds a socket itself. An ingest/playback
//! connection is reached only through these three traits, mirroring how
//! `examples/original_source/srt/server.go` wraps the `gosrt` library
//! behind `Listen`/`Accept`/`ConnRequest`/`Accept`/`Reject` calls — the
//! concrete SRT transport is supplied by an integrator, not by this crate.
//!
//! Grounded in shape on the teacher's `format/rtsp/connection.rs`, which
//! wraps an async I/O primitive behind a small connection type with
//! explicit error mapping.

use std::net::SocketAddr;

use async_trait::async_trait;

/// A connected, authenticated packet socket: one live SRT connection.
#[async_trait]
pub trait PacketSocket: Send {
    /// Reads the next available datagram into `buf`, returning the number
    /// of bytes written. `Ok(0)` signals a clean end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Writes `buf` as a single datagram.
    async fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// The peer's address, for logging and statistics.
    fn remote_addr(&self) -> SocketAddr;
}

/// Why a pending connection was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The authenticator denied the stream id.
    Unauthorized,
    /// The stream id itself failed to parse.
    BadRequest,
}

/// A pending connection, not yet accepted or rejected. Its stream id is
/// available before the handshake completes, so the listener can run
/// authentication before committing to the connection.
#[async_trait]
pub trait ConnRequest: Send {
    /// The raw stream id string the peer presented.
    fn stream_id(&self) -> &str;

    /// The peer's address.
    fn remote_addr(&self) -> SocketAddr;

    /// Completes the handshake, returning a live socket.
    async fn accept(self: Box<Self>) -> std::io::Result<Box<dyn PacketSocket>>;

    /// Rejects the connection.
    fn reject(self: Box<Self>, reason: RejectReason);
}

/// Accepts incoming connections on a bound endpoint.
#[async_trait]
pub trait PacketListener: Send {
    /// Waits for the next pending connection.
    async fn accept(&mut self) -> std::io::Result<Box<dyn ConnRequest>>;

    /// The address this listener is bound to.
    fn local_addr(&self) -> SocketAddr;

    /// Stops accepting and releases the bound endpoint.
    async fn close(&mut self) -> std::io::Result<()>;
}
