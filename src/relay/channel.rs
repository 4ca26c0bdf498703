//! # Fan-out channel
//!
//! A single publisher's bytes, broadcast to any number of subscribers
//! through bounded per-subscriber queues. A subscriber too slow to keep up
//! is dropped rather than allowed to stall the publisher or other
//! subscribers. Grounded on `examples/original_source/relay/channel.go`
//! (`Channel.Sub`/`Pub`/`Close`, the `buffersize/packetsize` queue sizing,
//! and the swap-remove-on-overflow policy), realized with
//! `tokio::sync::mpsc` bounded channels (the pack's standard async
//! broadcast-queue primitive) behind a `parking_lot::Mutex`, matching the
//! teacher's lock-primitive choice.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A point-in-time snapshot of a channel's subscriber count and age.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    /// Number of currently subscribed clients.
    pub client_count: usize,
    /// When the channel (i.e. the publish session) was created.
    pub created_at: DateTime<Utc>,
}

struct SubEntry {
    id: u64,
    sender: mpsc::Sender<Bytes>,
    queued: Arc<AtomicUsize>,
}

struct Inner {
    subs: Vec<SubEntry>,
    closed: bool,
}

/// A single stream's fan-out point: one publisher, many subscribers.
pub struct Channel {
    capacity: usize,
    created_at: DateTime<Utc>,
    next_id: AtomicU64,
    inner: Mutex<Inner>,
}

/// The receiving half of a subscription, handed to a play session.
pub struct Subscription {
    receiver: mpsc::Receiver<Bytes>,
    queued: Arc<AtomicUsize>,
    capacity: usize,
}

/// An idempotent capability to remove a subscription from its channel.
/// Calling [`release`](Release::release) more than once, or after the
/// channel has already closed, is a harmless no-op.
pub struct Release {
    channel: Option<Arc<Channel>>,
    id: u64,
}

impl Channel {
    /// Creates a new channel with room for `capacity` queued buffers per
    /// subscriber.
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Channel {
            capacity: capacity.max(1),
            created_at: Utc::now(),
            next_id: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                subs: Vec::new(),
                closed: false,
            }),
        })
    }

    /// Registers a new subscriber, returning its receiving half and the
    /// capability to unsubscribe it later.
    pub fn subscribe(self: &Arc<Self>) -> (Subscription, Release) {
        let mut inner = self.inner.lock();
        if inner.closed {
            drop(inner);
            let (tx, rx) = mpsc::channel(1);
            drop(tx); // immediately closed: recv() yields None right away
            return (
                Subscription {
                    receiver: rx,
                    queued: Arc::new(AtomicUsize::new(0)),
                    capacity: self.capacity,
                },
                Release {
                    channel: None,
                    id: 0,
                },
            );
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        let queued = Arc::new(AtomicUsize::new(0));
        inner.subs.push(SubEntry {
            id,
            sender: tx,
            queued: Arc::clone(&queued),
        });

        (
            Subscription {
                receiver: rx,
                queued,
                capacity: self.capacity,
            },
            Release {
                channel: Some(Arc::clone(self)),
                id,
            },
        )
    }

    /// Publishes a buffer to every current subscriber. Subscribers whose
    /// queue is full are dropped instead of blocking the publisher.
    pub fn publish(&self, data: Bytes) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.subs.retain(|sub| match sub.sender.try_send(data.clone()) {
            Ok(()) => {
                sub.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                log::info!("dropping slow subscriber {} (queue full)", sub.id);
                false
            }
        });
    }

    /// Closes the channel: every subscriber's receive loop observes the
    /// stream ending, and further `subscribe`/`publish` calls are no-ops.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subs.clear();
    }

    /// A point-in-time snapshot of this channel's state.
    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            client_count: self.inner.lock().subs.len(),
            created_at: self.created_at,
        }
    }
}

impl Release {
    /// Removes this subscription from its channel, if it hasn't been
    /// removed already.
    pub fn release(&self) {
        if let Some(channel) = &self.channel {
            let mut inner = channel.inner.lock();
            inner.subs.retain(|sub| sub.id != self.id);
        }
    }
}

impl Subscription {
    /// Waits for the next buffer, or `None` once the publisher has
    /// disconnected or the channel has closed.
    pub async fn recv(&mut self) -> Option<Bytes> {
        let item = self.receiver.recv().await;
        if item.is_some() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
        item
    }

    /// An estimate of how many buffers are currently queued for this
    /// subscriber.
    pub fn queue_len(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// The subscriber queue's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
