//! # Publish/play session loops
//!
//! The per-connection logic run once a `PacketSocket` has been accepted and
//! authenticated. Grounded on `examples/original_source/srt/server.go`'s
//! `publish`/`play` methods.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{RelayError, Result};
use crate::mpegts::{Demuxer, FeedOutcome};
use crate::relay::Relay;
use crate::transport::PacketSocket;

/// Reads from `socket` until it closes or errors, forwarding every buffer
/// into the named stream's channel. Returns once the publisher disconnects.
pub async fn handle_publish(
    relay: &Arc<Relay>,
    socket: &mut dyn PacketSocket,
    name: &str,
    max_read_size: usize,
) -> Result<()> {
    let tx = relay.publish(name)?;
    let mut buf = vec![0u8; max_read_size];

    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                log::info!("publish {} ended: {}", name, e);
                break;
            }
        };
        if tx.send(Bytes::copy_from_slice(&buf[..n])).is_err() {
            break; // the forwarder task already exited
        }
    }

    Ok(())
}

/// Subscribes to `name` and streams it to `socket`, running the sync
/// demuxer first if `sync_clients` requires it. Returns once the upstream
/// closes or a write fails.
pub async fn handle_play(
    relay: &Arc<Relay>,
    socket: &mut dyn PacketSocket,
    name: &str,
    sync_clients: bool,
) -> Result<()> {
    let (mut sub, _release) = relay.subscribe(name)?;
    let mut demux = Demuxer::new();
    let mut synced = !sync_clients;

    loop {
        let buf = match sub.recv().await {
            Some(b) => b,
            None => return Err(RelayError::UpstreamClosed),
        };

        if !synced {
            match demux.feed(&buf)? {
                FeedOutcome::Bypass => {
                    socket.write_all(&buf).await?;
                    synced = true;
                }
                FeedOutcome::Pending => {}
                FeedOutcome::Ready(init_packets) => {
                    for packet in init_packets {
                        socket.write_all(&packet).await?;
                    }
                    synced = true;
                }
            }
            continue;
        }

        if sub.queue_len() * 2 >= sub.capacity() {
            log::warn!(
                "subscriber to {} is falling behind: {}/{} buffers queued",
                name,
                sub.queue_len(),
                sub.capacity()
            );
        }

        socket.write_all(&buf).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockSocket;
    use std::net::SocketAddr;
    use tokio::io::{duplex, AsyncReadExt};

    fn addr() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn publish_forwards_to_subscriber() {
        let relay = Relay::new(4 * 1316, 1316);
        let (client, server) = duplex(4096);
        let mut publisher_socket = MockSocket::new(server, addr());

        let (mut sub, _release) = {
            // subscribe only after publish() has registered the name
            let relay2 = relay.clone();
            tokio::spawn(async move {
                handle_publish(&relay2, &mut publisher_socket, "alice", 1500)
                    .await
                    .unwrap();
            });
            tokio::task::yield_now().await;
            relay.subscribe("alice").unwrap()
        };

        let mut client = client;
        client.write_all_buf(&mut Bytes::from_static(b"hello world")).await.unwrap();
        drop(client);

        let received = sub.recv().await.unwrap();
        assert_eq!(&received[..], b"hello world");
    }

    #[tokio::test]
    async fn play_errors_when_stream_missing() {
        let relay = Relay::new(4 * 1316, 1316);
        let (_client, server) = duplex(4096);
        let mut socket = MockSocket::new(server, addr());
        let err = handle_play(&relay, &mut socket, "nobody", false)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::StreamNotFound));
    }
}
