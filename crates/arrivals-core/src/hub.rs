//! Fan-out of per-tick snapshot messages to live subscribers.
//!
//! Built on [`tokio::sync::broadcast`]: publishing never waits on a
//! subscriber, and each subscriber session makes its own single send
//! attempt per message. A subscriber that falls more than the channel
//! capacity behind receives [`broadcast::error::RecvError::Lagged`] and
//! resumes from the newest snapshot.

use arrivals_types::SnapshotMessage;
use tokio::sync::broadcast;

/// Default capacity of the subscriber channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Publisher side of the subscriber channel.
#[derive(Debug, Clone)]
pub struct SubscriberHub {
    tx: broadcast::Sender<SnapshotMessage>,
}

impl SubscriberHub {
    /// Create a hub buffering up to `capacity` messages per subscriber.
    ///
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new subscriber.
    ///
    /// The receiver yields every message published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SnapshotMessage> {
        self.tx.subscribe()
    }

    /// Publish a message to every current subscriber.
    ///
    /// Returns the number of subscribers the message was queued for.
    /// Zero subscribers is not an error.
    pub fn publish(&self, message: SnapshotMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SubscriberHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
