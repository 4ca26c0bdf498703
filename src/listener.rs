//! # Listener / server
//!
//! Runs one accept loop per bound endpoint: parses the stream id, gates it
//! through the authenticator, then spawns a session task. Grounded on
//! `examples/original_source/srt/server.go`'s `listenAt`/`shouldAccept`/
//! `Handle`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::Authenticator;
use crate::relay::{Relay, StreamStatistics};
use crate::session;
use crate::stream_id::{Mode, StreamId};
use crate::transport::{ConnRequest, PacketListener, RejectReason};

/// A connected socket's point-in-time statistics, as exposed over the
/// observability HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct SocketStatistics {
    /// Connection identifier, unique for the process lifetime.
    pub id: u64,
    /// The peer's address.
    pub remote_addr: String,
    /// The full stream id string presented at the handshake (not just the
    /// stream name), so a publish and a play connection on the same name
    /// can be told apart.
    pub stream_id: String,
    /// `"publish"` or `"play"`.
    pub mode: &'static str,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
}

struct ConnHandle {
    remote_addr: String,
    stream_id: String,
    mode: &'static str,
    connected_at: DateTime<Utc>,
}

/// Owns the relay registry and authenticator, and runs accept loops over
/// whatever `PacketListener`s are given to [`Server::listen`].
pub struct Server {
    relay: Arc<Relay>,
    auth: Arc<dyn Authenticator>,
    max_read_size: usize,
    sync_clients: bool,
    public_address: String,
    next_conn_id: AtomicU64,
    conns: Mutex<HashMap<u64, ConnHandle>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Builds a server around an existing relay registry and authenticator.
    /// `public_address` is advertised to clients in stream statistics URLs.
    pub fn new(
        relay: Arc<Relay>,
        auth: Arc<dyn Authenticator>,
        max_read_size: usize,
        sync_clients: bool,
        public_address: String,
    ) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Arc::new(Server {
            relay,
            auth,
            max_read_size,
            sync_clients,
            public_address,
            next_conn_id: AtomicU64::new(0),
            conns: Mutex::new(HashMap::new()),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Signals every running accept loop and session to wind down. Does not
    /// wait for them to finish; join the handles returned by [`Server::listen`]
    /// for that.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Runs an accept loop over `listener` until [`Server::shutdown`] is
    /// called.
    pub fn listen<L>(self: &Arc<Self>, mut listener: L) -> JoinHandle<()>
    where
        L: PacketListener + 'static,
    {
        let server = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        let _ = listener.close().await;
                        break;
                    }
                    result = listener.accept() => {
                        match result {
                            Ok(req) => {
                                let server = Arc::clone(&server);
                                tokio::spawn(async move { server.handle_request(req).await });
                            }
                            Err(e) => {
                                log::error!("accept error on {}: {}", listener.local_addr(), e);
                            }
                        }
                    }
                }
            }
        })
    }

    async fn handle_request(self: Arc<Self>, req: Box<dyn ConnRequest>) {
        let remote_addr = req.remote_addr();
        let stream_id = match StreamId::parse(req.stream_id()) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("rejecting {}: invalid stream id: {}", remote_addr, e);
                req.reject(RejectReason::BadRequest);
                return;
            }
        };

        if !self.auth.authenticate(&stream_id).await {
            log::info!("denying {} for {}", remote_addr, stream_id.as_str());
            req.reject(RejectReason::Unauthorized);
            return;
        }

        let socket = match req.accept().await {
            Ok(socket) => socket,
            Err(e) => {
                log::error!("accept handshake failed for {}: {}", remote_addr, e);
                return;
            }
        };

        self.run_session(socket, stream_id).await;
    }

    async fn run_session(self: Arc<Self>, mut socket: Box<dyn crate::transport::PacketSocket>, stream_id: StreamId) {
        let remote_addr = socket.remote_addr();
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let mode_str = match stream_id.mode() {
            Mode::Publish => "publish",
            Mode::Play => "play",
        };

        self.conns.lock().insert(
            conn_id,
            ConnHandle {
                remote_addr: remote_addr.to_string(),
                stream_id: stream_id.as_str().to_string(),
                mode: mode_str,
                connected_at: Utc::now(),
            },
        );

        let result = match stream_id.mode() {
            Mode::Publish => {
                session::handle_publish(&self.relay, socket.as_mut(), stream_id.name(), self.max_read_size)
                    .await
            }
            Mode::Play => {
                session::handle_play(&self.relay, socket.as_mut(), stream_id.name(), self.sync_clients)
                    .await
            }
        };

        if let Err(e) = result {
            log::info!("session for {} ({}) ended: {}", stream_id.name(), remote_addr, e);
        }

        self.conns.lock().remove(&conn_id);
    }

    /// A snapshot of every currently connected socket.
    pub fn socket_statistics(&self) -> Vec<SocketStatistics> {
        self.conns
            .lock()
            .iter()
            .map(|(id, handle)| SocketStatistics {
                id: *id,
                remote_addr: handle.remote_addr.clone(),
                stream_id: handle.stream_id.clone(),
                mode: handle.mode,
                connected_at: handle.connected_at,
            })
            .collect()
    }

    /// A snapshot of every active stream's statistics, with `url` filled in
    /// from the configured public address.
    pub fn statistics(&self) -> Vec<StreamStatistics> {
        let mut streams = self.relay.statistics();
        for stream in &mut streams {
            stream.url = format!(
                "srt://{}?streamid=#!::m=request,r={}",
                self.public_address, stream.name
            );
        }
        streams
    }

    /// The relay registry this server dispatches sessions against.
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }
}
