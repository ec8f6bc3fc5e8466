//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - 登録解除と退出通知のブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 切断したクライアント自身には通知が届かないことを保証
//! - 再接続で置き換えられた古い接続の後始末で、新しい接続が消されないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断と退出通知
//! - エッジケース：既に置き換えられた接続の切断（通知なし）

use std::sync::Arc;

use hikyaku_shared::protocol;

use crate::domain::{BroadcastReport, ClientId, ConnectionId, ConnectionRegistry};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    /// ConnectionRegistry（接続とキューの管理）
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// クライアント切断を実行
    ///
    /// # Arguments
    ///
    /// * `client_id` - 切断するクライアントの ID（Domain Model）
    /// * `connection_id` - 切断された接続の ID
    ///
    /// # Returns
    ///
    /// * `Some(BroadcastReport)` - 登録を解除し、残りのクライアントに退出通知を送った
    /// * `None` - 接続は既に置き換えられていた（クライアントはまだオンライン）
    pub async fn execute(
        &self,
        client_id: ClientId,
        connection_id: ConnectionId,
    ) -> Option<BroadcastReport> {
        if !self
            .registry
            .disconnect_connection(client_id, connection_id)
            .await
        {
            return None;
        }

        let notice = protocol::departure_notice(client_id.value());
        let report = self.registry.broadcast(notice).await;
        if !report.failed.is_empty() {
            tracing::warn!(
                "Departure notice for client {} failed for {} recipient(s)",
                client_id,
                report.failed.len()
            );
        }

        Some(report)
    }
}
