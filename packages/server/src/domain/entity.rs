//! Entities: live connections and per-client offline queues.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use super::{ClientId, ConnectionId, RegistryError, Timestamp};

/// Outbound channel of one connection.
///
/// A writer task on the transport side drains it into the socket; dropping
/// every sender ends that task and closes the socket.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Writable handle to one client's transport channel
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    client_id: ClientId,
    sender: PusherChannel,
}

impl Connection {
    /// Wrap a freshly accepted channel under a new ConnectionId
    pub fn new(client_id: ClientId, sender: PusherChannel) -> Self {
        Self::with_id(ConnectionId::generate(), client_id, sender)
    }

    pub fn with_id(id: ConnectionId, client_id: ClientId, sender: PusherChannel) -> Self {
        Self {
            id,
            client_id,
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Push one text frame
    pub fn send(&self, frame: &str) -> Result<(), RegistryError> {
        self.sender
            .send(frame.to_string())
            .map_err(|_| RegistryError::TransportFailure(self.client_id))
    }

    /// Release the handle. The transport writer sees the channel end and closes the socket.
    pub fn close(self) {
        tracing::debug!(
            "Closing connection {} of client {}",
            self.id,
            self.client_id
        );
        drop(self.sender);
    }
}

/// Text message waiting for an offline client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub text: String,
    pub enqueued_at: Timestamp,
}

impl QueuedMessage {
    pub fn new(text: String, enqueued_at: Timestamp) -> Self {
        Self { text, enqueued_at }
    }
}

/// Bounded FIFO of undelivered text messages for one client id.
///
/// Insertion order is delivery order. When full, the oldest message is evicted.
#[derive(Debug, Clone)]
pub struct MessageQueue {
    messages: VecDeque<QueuedMessage>,
    capacity: usize,
}

impl MessageQueue {
    /// Create an empty queue; a capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a message, returning the evicted oldest one if the queue was full
    pub fn push(&mut self, message: QueuedMessage) -> Option<QueuedMessage> {
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        evicted
    }

    /// Drop every message enqueued at or before `now - retention_millis`.
    ///
    /// Returns the number of messages dropped.
    pub fn prune_expired(&mut self, now: Timestamp, retention_millis: i64) -> usize {
        let cutoff = now.saturating_sub_millis(retention_millis);
        let before = self.messages.len();
        self.messages.retain(|message| message.enqueued_at > cutoff);
        before - self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedMessage> {
        self.messages.iter()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
