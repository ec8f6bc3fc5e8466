//! ConnectionRegistry trait 定義
//!
//! 接続中クライアントのハンドルと、オフラインのクライアント宛てテキストの
//! キューを一体で管理するインターフェース。具体的な実装は Infrastructure 層が
//! 提供します（依存性の逆転）。

use std::collections::BTreeMap;

use async_trait::async_trait;
use hikyaku_shared::time::MILLIS_PER_DAY;

use super::{ClientId, Connection, ConnectionId, RegistryError};

/// Default retention window for queued messages
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Default maximum number of queued messages per client id
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Delivery policy knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Queued messages older than this many days are dropped at prune time
    pub retention_days: u32,
    /// Per-client queue bound; the oldest message is evicted beyond it
    pub queue_capacity: usize,
    /// Clear a client's queue once it has been flushed on connect.
    /// Off by default: queued messages are re-sent on every reconnect until they expire.
    pub drain_on_flush: bool,
}

impl RegistryConfig {
    pub fn retention_millis(&self) -> i64 {
        i64::from(self.retention_days) * MILLIS_PER_DAY
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            drain_on_flush: false,
        }
    }
}

/// Result of registering a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectOutcome {
    /// Queued messages pushed to the new connection
    pub flushed: usize,
    /// Queued messages dropped for being past retention
    pub pruned: usize,
    /// A previous connection for the same client id was closed
    pub replaced: bool,
}

/// What happened to a text message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Pushed to the live connection
    Sent,
    /// Target offline; stored for its next connect
    Queued,
}

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDelivery {
    /// Header and EOF frames pushed to the live connection
    Sent,
    /// Target offline; files are never queued
    Dropped,
}

/// Per-recipient outcome of a broadcast
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub delivered: Vec<ClientId>,
    pub failed: Vec<ClientId>,
}

/// Read-only view of the registry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrySnapshot {
    /// Live client ids, ascending
    pub connected: Vec<ClientId>,
    /// Queued message count per client id that has a queue
    pub queued: BTreeMap<ClientId, usize>,
}

/// Connection registry and delivery engine
///
/// Implementations must make every operation atomic with respect to both the
/// connection map and the queues.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register `connection` under its client id.
    ///
    /// Closes any connection previously registered for that id, prunes the
    /// id's queue, and pushes the surviving queued messages to `connection`
    /// in order before registering it.
    async fn connect(&self, connection: Connection) -> Result<ConnectOutcome, RegistryError>;

    /// Remove and close the live connection of `client_id`. Absent ids are tolerated.
    async fn disconnect(&self, client_id: ClientId) -> bool;

    /// Like `disconnect`, but only when the registered connection is `connection_id`
    async fn disconnect_connection(&self, client_id: ClientId, connection_id: ConnectionId)
    -> bool;

    /// Send `message` to a live target or queue it for an offline one
    async fn deliver(
        &self,
        message: String,
        target_id: ClientId,
    ) -> Result<Delivery, RegistryError>;

    /// Send a file to a live target as `FILE:<type>:<data>` followed by `EOF`.
    /// Offline targets are skipped.
    async fn deliver_file(
        &self,
        file_type: String,
        file_data: String,
        target_id: ClientId,
    ) -> Result<FileDelivery, RegistryError>;

    /// Send `message` to every live connection; failures are isolated per recipient
    async fn broadcast(&self, message: String) -> BroadcastReport;

    async fn snapshot(&self) -> RegistrySnapshot;
}
