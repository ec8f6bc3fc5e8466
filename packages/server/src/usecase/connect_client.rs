//! UseCase: クライアント接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() メソッド
//! - 新しい Connection の生成と Registry への登録
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録成功（キュー flush の結果が返る）
//! - 異常系：flush 中に接続が閉じていた

use std::sync::Arc;

use crate::domain::{
    ClientId, ConnectOutcome, Connection, ConnectionId, ConnectionRegistry, PusherChannel,
};

use super::error::ConnectError;

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// ConnectionRegistry（接続とキューの管理）
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `client_id` - 接続するクライアントの ID（Domain Model）
    /// * `sender` - クライアントへのフレーム送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok((ConnectionId, ConnectOutcome))` - 切断時に使う接続 ID と flush の結果
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(
        &self,
        client_id: ClientId,
        sender: PusherChannel,
    ) -> Result<(ConnectionId, ConnectOutcome), ConnectError> {
        let connection = Connection::new(client_id, sender);
        let connection_id = connection.id();

        let outcome = self.registry.connect(connection).await?;
        if outcome.flushed > 0 || outcome.pruned > 0 {
            tracing::info!(
                "Flushed {} queued message(s) to client {} ({} expired)",
                outcome.flushed,
                client_id,
                outcome.pruned
            );
        }

        Ok((connection_id, outcome))
    }
}
