//! InMemory ConnectionRegistry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! 接続マップとキューマップを 1 つの Mutex で保護し、両者の更新を
//! 常に一体で行います（接続中の flush と並行する deliver が割り込まない）。
//!
//! プロセス終了とともにキューは失われます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use hikyaku_shared::{protocol, time::Clock};
use tokio::sync::Mutex;

use crate::domain::{
    BroadcastReport, ClientId, ConnectOutcome, Connection, ConnectionId, ConnectionRegistry,
    Delivery, FileDelivery, MessageQueue, QueuedMessage, RegistryConfig, RegistryError,
    RegistrySnapshot, Timestamp,
};

/// 接続マップとキューマップ
#[derive(Default)]
struct RegistryState {
    /// 接続中のクライアント（1 クライアント ID につき最大 1 接続）
    connections: HashMap<ClientId, Connection>,
    /// 未配信テキストのキュー（一度作られたら削除されない）
    queues: HashMap<ClientId, MessageQueue>,
}

/// インメモリ ConnectionRegistry 実装
pub struct InMemoryConnectionRegistry {
    state: Mutex<RegistryState>,
    config: RegistryConfig,
    clock: Arc<dyn Clock>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    ///
    /// # 引数
    ///
    /// - `config`: 保持期間・キュー容量などの配信ポリシー
    /// - `clock`: キュー投入時刻と prune 基準時刻の取得元
    pub fn new(config: RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            config,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn connect(&self, connection: Connection) -> Result<ConnectOutcome, RegistryError> {
        let client_id = connection.client_id();
        let now = self.now();
        let mut state = self.state.lock().await;
        let mut outcome = ConnectOutcome::default();

        if let Some(queue) = state.queues.get_mut(&client_id) {
            outcome.pruned = queue.prune_expired(now, self.config.retention_millis());
            for message in queue.iter() {
                connection.send(&message.text)?;
                outcome.flushed += 1;
            }
            if self.config.drain_on_flush {
                queue.clear();
            }
        }

        if let Some(previous) = state.connections.insert(client_id, connection) {
            tracing::info!(
                "Client {} reconnected; closing previous connection {}",
                client_id,
                previous.id()
            );
            previous.close();
            outcome.replaced = true;
        }

        tracing::debug!(
            "Client {} registered (flushed: {}, pruned: {})",
            client_id,
            outcome.flushed,
            outcome.pruned
        );

        Ok(outcome)
    }

    async fn disconnect(&self, client_id: ClientId) -> bool {
        let mut state = self.state.lock().await;
        match state.connections.remove(&client_id) {
            Some(connection) => {
                connection.close();
                tracing::debug!("Client {} unregistered", client_id);
                true
            }
            None => {
                tracing::debug!("Client {} was not registered, nothing to remove", client_id);
                false
            }
        }
    }

    async fn disconnect_connection(
        &self,
        client_id: ClientId,
        connection_id: ConnectionId,
    ) -> bool {
        let mut state = self.state.lock().await;
        let is_current = state
            .connections
            .get(&client_id)
            .is_some_and(|connection| connection.id() == connection_id);

        if !is_current {
            tracing::debug!(
                "Connection {} of client {} is no longer registered",
                connection_id,
                client_id
            );
            return false;
        }

        if let Some(connection) = state.connections.remove(&client_id) {
            connection.close();
        }
        tracing::debug!(
            "Client {} unregistered (connection {})",
            client_id,
            connection_id
        );
        true
    }

    async fn deliver(
        &self,
        message: String,
        target_id: ClientId,
    ) -> Result<Delivery, RegistryError> {
        let now = self.now();
        let mut state = self.state.lock().await;

        if let Some(connection) = state.connections.get(&target_id) {
            connection.send(&message)?;
            tracing::debug!("Delivered message to client {}", target_id);
            return Ok(Delivery::Sent);
        }

        let capacity = self.config.queue_capacity;
        let queue = state
            .queues
            .entry(target_id)
            .or_insert_with(|| MessageQueue::new(capacity));
        if queue.push(QueuedMessage::new(message, now)).is_some() {
            tracing::warn!(
                "Queue of client {} is full ({}); evicted the oldest message",
                target_id,
                capacity
            );
        }
        tracing::debug!(
            "Client {} is offline; queued message ({} pending)",
            target_id,
            queue.len()
        );

        Ok(Delivery::Queued)
    }

    async fn deliver_file(
        &self,
        file_type: String,
        file_data: String,
        target_id: ClientId,
    ) -> Result<FileDelivery, RegistryError> {
        let state = self.state.lock().await;

        let Some(connection) = state.connections.get(&target_id) else {
            tracing::debug!(
                "Client {} is offline; dropping {} file",
                target_id,
                file_type
            );
            return Ok(FileDelivery::Dropped);
        };

        connection.send(&protocol::outbound_file_frame(&file_type, &file_data))?;
        connection.send(protocol::EOF_FRAME)?;
        tracing::debug!(
            "Delivered {} file ({} bytes) to client {}",
            file_type,
            file_data.len(),
            target_id
        );

        Ok(FileDelivery::Sent)
    }

    async fn broadcast(&self, message: String) -> BroadcastReport {
        let state = self.state.lock().await;
        let mut report = BroadcastReport::default();

        for (client_id, connection) in state.connections.iter() {
            // ブロードキャストでは一部の送信失敗を許容
            match connection.send(&message) {
                Ok(()) => report.delivered.push(*client_id),
                Err(e) => {
                    tracing::warn!("Failed to broadcast to client {}: {}", client_id, e);
                    report.failed.push(*client_id);
                }
            }
        }

        report
    }

    async fn snapshot(&self) -> RegistrySnapshot {
        let state = self.state.lock().await;

        let mut connected: Vec<ClientId> = state.connections.keys().copied().collect();
        connected.sort();
        let queued = state
            .queues
            .iter()
            .map(|(client_id, queue)| (*client_id, queue.len()))
            .collect();

        RegistrySnapshot { connected, queued }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hikyaku_shared::time::ManualClock;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - connect: キューの prune と flush、再接続時の置き換え
    // - deliver: 接続中なら送信、オフラインならキュー投入
    // - deliver_file: 接続中のみ 2 フレーム送信、オフラインなら破棄
    // - broadcast: 壊れた接続があっても他の接続へ届く
    // - disconnect / disconnect_connection: 存在しない ID を許容
    //
    // 【なぜこのテストが必要か】
    // - Registry は配信順序と保持期間の唯一の担い手
    // - オフライン配信・再送・ファイル非保存の非対称性を保証する必要がある
    // ========================================

    const START: i64 = 1_700_000_000_000;

    fn id(value: u64) -> ClientId {
        ClientId::new(value).unwrap()
    }

    fn create_test_registry(
        config: RegistryConfig,
    ) -> (InMemoryConnectionRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let registry = InMemoryConnectionRegistry::new(config, clock.clone());
        (registry, clock)
    }

    fn open(client_id: ClientId) -> (Connection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(client_id, tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn test_deliver_to_live_client() {
        // テスト項目: 接続中のクライアントにはテキストがそのまま届く
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (connection, mut rx) = open(id(2));
        registry.connect(connection).await.unwrap();

        // when (操作):
        let result = registry.deliver("hello".to_string(), id(2)).await;

        // then (期待する結果):
        assert_eq!(result, Ok(Delivery::Sent));
        assert_eq!(drain(&mut rx), vec!["hello"]);
        assert!(registry.snapshot().await.queued.is_empty());
    }

    #[tokio::test]
    async fn test_offline_messages_flushed_in_order_on_connect() {
        // テスト項目: オフライン中のメッセージが接続時に送信順で届く
        // given (前提条件):
        let (registry, clock) = create_test_registry(RegistryConfig::default());
        for text in ["one", "two:with colon", "three"] {
            let result = registry.deliver(text.to_string(), id(2)).await;
            assert_eq!(result, Ok(Delivery::Queued));
            clock.advance(1_000);
        }
        clock.advance_days(30);

        // when (操作):
        let (connection, mut rx) = open(id(2));
        let outcome = registry.connect(connection).await.unwrap();

        // then (期待する結果):
        assert_eq!(drain(&mut rx), vec!["one", "two:with colon", "three"]);
        assert_eq!(
            outcome,
            ConnectOutcome {
                flushed: 3,
                pruned: 0,
                replaced: false,
            }
        );
    }

    #[tokio::test]
    async fn test_expired_messages_are_never_delivered() {
        // テスト項目: 90 日を超えたメッセージは接続時に配信されず削除される
        // given (前提条件):
        let (registry, clock) = create_test_registry(RegistryConfig::default());
        registry.deliver("old".to_string(), id(2)).await.unwrap();
        clock.advance_days(2);
        registry.deliver("recent".to_string(), id(2)).await.unwrap();
        clock.advance_days(89);

        // when (操作):
        let (connection, mut rx) = open(id(2));
        let outcome = registry.connect(connection).await.unwrap();

        // then (期待する結果):
        assert_eq!(drain(&mut rx), vec!["recent"]);
        assert_eq!(outcome.pruned, 1);
        assert_eq!(registry.snapshot().await.queued.get(&id(2)), Some(&1));
    }

    #[tokio::test]
    async fn test_queue_is_redelivered_on_every_reconnect_by_default() {
        // テスト項目: デフォルトではキューは flush 後も残り、再接続のたびに再送される
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        registry.deliver("hello".to_string(), id(2)).await.unwrap();
        let (first, mut first_rx) = open(id(2));
        registry.connect(first).await.unwrap();
        registry.disconnect(id(2)).await;

        // when (操作):
        let (second, mut second_rx) = open(id(2));
        registry.connect(second).await.unwrap();

        // then (期待する結果):
        assert_eq!(drain(&mut first_rx), vec!["hello"]);
        assert_eq!(drain(&mut second_rx), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_drain_on_flush_clears_queue() {
        // テスト項目: drain_on_flush が有効なら flush 後にキューが空になる
        // given (前提条件):
        let config = RegistryConfig {
            drain_on_flush: true,
            ..RegistryConfig::default()
        };
        let (registry, _clock) = create_test_registry(config);
        registry.deliver("hello".to_string(), id(2)).await.unwrap();
        let (first, mut first_rx) = open(id(2));
        registry.connect(first).await.unwrap();
        registry.disconnect(id(2)).await;

        // when (操作):
        let (second, mut second_rx) = open(id(2));
        let outcome = registry.connect(second).await.unwrap();

        // then (期待する結果):
        assert_eq!(drain(&mut first_rx), vec!["hello"]);
        assert!(drain(&mut second_rx).is_empty());
        assert_eq!(outcome.flushed, 0);
        // キー自体は空のキューとして残る
        assert_eq!(registry.snapshot().await.queued.get(&id(2)), Some(&0));
    }

    #[tokio::test]
    async fn test_queue_capacity_evicts_oldest() {
        // テスト項目: キュー容量を超えると最も古いメッセージが追い出される
        // given (前提条件):
        let config = RegistryConfig {
            queue_capacity: 2,
            ..RegistryConfig::default()
        };
        let (registry, _clock) = create_test_registry(config);

        // when (操作):
        for text in ["a", "b", "c"] {
            registry.deliver(text.to_string(), id(9)).await.unwrap();
        }
        let (connection, mut rx) = open(id(9));
        registry.connect(connection).await.unwrap();

        // then (期待する結果):
        assert_eq!(drain(&mut rx), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_deliver_file_to_live_client_sends_two_frames() {
        // テスト項目: 接続中のクライアントへのファイルは FILE フレームと EOF の 2 フレーム
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (connection, mut rx) = open(id(42));
        registry.connect(connection).await.unwrap();

        // when (操作):
        let result = registry
            .deliver_file("png".to_string(), "AAAA".to_string(), id(42))
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(FileDelivery::Sent));
        assert_eq!(drain(&mut rx), vec!["FILE:png:AAAA", "EOF"]);
    }

    #[tokio::test]
    async fn test_deliver_file_to_offline_client_is_dropped() {
        // テスト項目: オフラインのクライアントへのファイルは保存されず、後からも届かない
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());

        // when (操作):
        let result = registry
            .deliver_file("png".to_string(), "AAAA".to_string(), id(42))
            .await;
        let (connection, mut rx) = open(id(42));
        let outcome = registry.connect(connection).await.unwrap();

        // then (期待する結果):
        assert_eq!(result, Ok(FileDelivery::Dropped));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(outcome.flushed, 0);
        assert!(registry.snapshot().await.queued.is_empty());
    }

    #[tokio::test]
    async fn test_reconnect_replaces_and_closes_previous_connection() {
        // テスト項目: 同じ ID の再接続で古い接続は閉じられ、以後のメッセージを受け取らない
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (old, mut old_rx) = open(id(5));
        registry.connect(old).await.unwrap();

        // when (操作):
        let (new, mut new_rx) = open(id(5));
        let outcome = registry.connect(new).await.unwrap();
        registry.deliver("after".to_string(), id(5)).await.unwrap();

        // then (期待する結果):
        assert!(outcome.replaced);
        assert_eq!(new_rx.recv().await, Some("after".to_string()));
        // 古い接続のチャンネルは閉じられている
        assert_eq!(old_rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_deliver_to_closed_connection_is_transport_failure() {
        // テスト項目: 送信先の接続が既に閉じていれば TransportFailure が返る
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (connection, rx) = open(id(3));
        registry.connect(connection).await.unwrap();
        drop(rx);

        // when (操作):
        let result = registry.deliver("hello".to_string(), id(3)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::TransportFailure(id(3))));
    }

    #[tokio::test]
    async fn test_connect_fails_when_new_connection_already_closed() {
        // テスト項目: flush 中に新しい接続が閉じていた場合、登録されない
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        registry.deliver("hello".to_string(), id(3)).await.unwrap();
        let (connection, rx) = open(id(3));
        drop(rx);

        // when (操作):
        let result = registry.connect(connection).await;

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::TransportFailure(id(3))));
        assert!(registry.snapshot().await.connected.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_isolates_broken_connection() {
        // テスト項目: 壊れた接続が 1 つあっても残りの全員に届く
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (c1, mut rx1) = open(id(1));
        let (c2, rx2) = open(id(2));
        let (c3, mut rx3) = open(id(3));
        registry.connect(c1).await.unwrap();
        registry.connect(c2).await.unwrap();
        registry.connect(c3).await.unwrap();
        drop(rx2);

        // when (操作):
        let mut report = registry.broadcast("notice".to_string()).await;

        // then (期待する結果):
        report.delivered.sort();
        assert_eq!(report.delivered, vec![id(1), id(3)]);
        assert_eq!(report.failed, vec![id(2)]);
        assert_eq!(drain(&mut rx1), vec!["notice"]);
        assert_eq!(drain(&mut rx3), vec!["notice"]);
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        // テスト項目: 接続がなくてもブロードキャストはエラーにならない
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());

        // when (操作):
        let report = registry.broadcast("notice".to_string()).await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_disconnect_unknown_client_is_tolerated() {
        // テスト項目: 未接続の ID の切断はパニックせず false を返す
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());

        // when (操作):
        let removed = registry.disconnect(id(77)).await;

        // then (期待する結果):
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_disconnect_queues_later_messages() {
        // テスト項目: 切断後のメッセージはキューに入る
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (connection, mut rx) = open(id(4));
        registry.connect(connection).await.unwrap();

        // when (操作):
        let removed = registry.disconnect(id(4)).await;
        let result = registry.deliver("later".to_string(), id(4)).await;

        // then (期待する結果):
        assert!(removed);
        assert_eq!(result, Ok(Delivery::Queued));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_disconnect_connection_ignores_superseded_connection() {
        // テスト項目: 置き換え済みの古い接続 ID では新しい接続は削除されない
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (old, _old_rx) = open(id(5));
        let old_id = old.id();
        registry.connect(old).await.unwrap();
        let (new, _new_rx) = open(id(5));
        let new_id = new.id();
        registry.connect(new).await.unwrap();

        // when (操作):
        let removed_old = registry.disconnect_connection(id(5), old_id).await;
        let connected_after_old = registry.snapshot().await.connected;
        let removed_new = registry.disconnect_connection(id(5), new_id).await;

        // then (期待する結果):
        assert!(!removed_old);
        assert_eq!(connected_after_old, vec![id(5)]);
        assert!(removed_new);
        assert!(registry.snapshot().await.connected.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_lists_sorted_connections_and_queue_sizes() {
        // テスト項目: snapshot は接続中 ID（昇順）とキュー件数を返す
        // given (前提条件):
        let (registry, _clock) = create_test_registry(RegistryConfig::default());
        let (c3, _rx3) = open(id(3));
        let (c1, _rx1) = open(id(1));
        registry.connect(c3).await.unwrap();
        registry.connect(c1).await.unwrap();
        registry.deliver("x".to_string(), id(8)).await.unwrap();
        registry.deliver("y".to_string(), id(8)).await.unwrap();

        // when (操作):
        let snapshot = registry.snapshot().await;

        // then (期待する結果):
        assert_eq!(snapshot.connected, vec![id(1), id(3)]);
        assert_eq!(snapshot.queued.get(&id(8)), Some(&2));
    }

    #[tokio::test]
    async fn test_concurrent_connects_and_deliveries() {
        // テスト項目: 並行した接続・配信でもメッセージが失われない
        // given (前提条件):
        let clock = Arc::new(ManualClock::new(START));
        let registry = Arc::new(InMemoryConnectionRegistry::new(
            RegistryConfig::default(),
            clock,
        ));
        let mut receivers = Vec::new();
        let mut handles = Vec::new();

        // when (操作): 10 クライアントの接続と、それぞれへの配信を並行実行
        for value in 1..=10 {
            let (connection, rx) = open(id(value));
            receivers.push(rx);
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.connect(connection).await.unwrap();
            }));
        }
        for value in 1..=10 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .deliver(format!("to {}", value), id(value))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果): 各クライアントはちょうど 1 通受け取る（直接 or flush）
        for (index, rx) in receivers.iter_mut().enumerate() {
            let frames = drain(rx);
            assert_eq!(frames, vec![format!("to {}", index + 1)]);
        }
        assert_eq!(registry.snapshot().await.connected.len(), 10);
    }
}
