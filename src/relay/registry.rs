//! # Relay registry
//!
//! The single source of truth mapping stream names to their active
//! `Channel`. Grounded on `examples/original_source/relay/relay.go`'s
//! `Relay` (the forwarder goroutine draining a publisher into its channel,
//! teardown on producer close, `GetStatistics`).

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{RelayError, Result};
use crate::relay::channel::{Channel, Release, Subscription};

/// A published stream's point-in-time statistics, as exposed over the
/// observability HTTP surface.
///
/// `url` is left blank here; the [`crate::listener::Server`] fills it in
/// with the configured public address, since the registry itself has no
/// notion of where it is reachable from.
#[derive(Debug, Clone, Serialize)]
pub struct StreamStatistics {
    /// The stream's name.
    pub name: String,
    /// The playback URL a client should connect to, e.g.
    /// `srt://host:1337?streamid=#!::m=request,r=name`.
    pub url: String,
    /// Number of currently subscribed clients.
    pub clients: usize,
    /// When the stream was published.
    pub created: DateTime<Utc>,
}

struct Entry {
    channel: Arc<Channel>,
    created_at: DateTime<Utc>,
}

/// The process-wide registry of active streams.
pub struct Relay {
    buffer_size: usize,
    packet_size: usize,
    streams: Mutex<HashMap<String, Entry>>,
}

impl Relay {
    /// Creates an empty registry. `buffer_size`/`packet_size` set the
    /// per-subscriber queue depth: `buffer_size / packet_size` buffers.
    pub fn new(buffer_size: usize, packet_size: usize) -> Arc<Self> {
        Arc::new(Relay {
            buffer_size,
            packet_size,
            streams: Mutex::new(HashMap::new()),
        })
    }

    /// Claims `name` for a new publisher, returning the sender half the
    /// caller should push received buffers into. Fails if the name is
    /// already in use.
    pub fn publish(self: &Arc<Self>, name: &str) -> Result<mpsc::UnboundedSender<Bytes>> {
        let mut streams = self.streams.lock();
        if streams.contains_key(name) {
            return Err(RelayError::StreamExists);
        }

        let capacity = (self.buffer_size / self.packet_size.max(1)).max(1);
        let channel = Channel::new(capacity);
        streams.insert(
            name.to_string(),
            Entry {
                channel: Arc::clone(&channel),
                created_at: Utc::now(),
            },
        );
        drop(streams);

        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let relay = Arc::clone(self);
        let name_owned = name.to_string();
        tokio::spawn(async move {
            while let Some(buf) = rx.recv().await {
                channel.publish(buf);
            }
            relay.streams.lock().remove(&name_owned);
            channel.close();
            log::info!("stream {} torn down", name_owned);
        });

        Ok(tx)
    }

    /// Subscribes to an existing stream. Fails if no publisher is active
    /// under `name`.
    pub fn subscribe(&self, name: &str) -> Result<(Subscription, Release)> {
        let streams = self.streams.lock();
        let entry = streams.get(name).ok_or(RelayError::StreamNotFound)?;
        Ok(entry.channel.subscribe())
    }

    /// Whether a publisher is currently active under `name`.
    pub fn channel_exists(&self, name: &str) -> bool {
        self.streams.lock().contains_key(name)
    }

    /// A snapshot of every active stream's statistics.
    pub fn statistics(&self) -> Vec<StreamStatistics> {
        self.streams
            .lock()
            .iter()
            .map(|(name, entry)| StreamStatistics {
                name: name.clone(),
                url: String::new(),
                clients: entry.channel.stats().client_count,
                created: entry.created_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_subscribe_delivers_data() {
        let relay = Relay::new(4 * 1316, 1316);
        let tx = relay.publish("alice").unwrap();
        let (mut sub, _release) = relay.subscribe("alice").unwrap();
        tx.send(Bytes::from_static(b"chunk")).unwrap();
        assert_eq!(sub.recv().await, Some(Bytes::from_static(b"chunk")));
    }

    #[tokio::test]
    async fn double_publish_is_rejected() {
        let relay = Relay::new(4 * 1316, 1316);
        let _tx = relay.publish("alice").unwrap();
        assert!(matches!(relay.publish("alice"), Err(RelayError::StreamExists)));
    }

    #[tokio::test]
    async fn subscribe_to_missing_stream_fails() {
        let relay = Relay::new(4 * 1316, 1316);
        assert!(matches!(
            relay.subscribe("nobody"),
            Err(RelayError::StreamNotFound)
        ));
    }

    #[tokio::test]
    async fn channel_exists_reflects_active_publishers() {
        let relay = Relay::new(4 * 1316, 1316);
        assert!(!relay.channel_exists("alice"));
        let _tx = relay.publish("alice").unwrap();
        assert!(relay.channel_exists("alice"));
    }

    #[tokio::test]
    async fn statistics_report_client_count_with_blank_url() {
        let relay = Relay::new(4 * 1316, 1316);
        let _tx = relay.publish("alice").unwrap();
        let (_sub, _release) = relay.subscribe("alice").unwrap();

        let stats = relay.statistics();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "alice");
        assert_eq!(stats[0].clients, 1);
        assert_eq!(stats[0].url, "");
    }

    #[tokio::test]
    async fn publisher_disconnect_tears_down_stream() {
        let relay = Relay::new(4 * 1316, 1316);
        let tx = relay.publish("alice").unwrap();
        drop(tx);
        // give the forwarder task a chance to observe the close
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!relay.channel_exists("alice"));
    }
}
