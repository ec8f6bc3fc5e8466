//! UseCase: 受信フレームの中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayFrameUseCase::execute() メソッド
//! - フレームの解析と deliver / deliver_file への振り分け
//!
//! ### なぜこのテストが必要か
//! - 不正なフレームで接続やプロセスが落ちないことを保証
//! - テキストとファイルで配信経路が異なることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：テキスト / ファイルの中継
//! - 異常系：文法違反のフレーム、送信先接続の失敗

use std::sync::Arc;

use hikyaku_shared::protocol::{InboundFrame, ProtocolError};

use crate::domain::{ClientId, ConnectionRegistry, Delivery, FileDelivery};

use super::error::RelayError;

/// 中継結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Text { target_id: ClientId, delivery: Delivery },
    File { target_id: ClientId, delivery: FileDelivery },
}

/// 受信フレーム中継のユースケース
pub struct RelayFrameUseCase {
    /// ConnectionRegistry（接続とキューの管理）
    registry: Arc<dyn ConnectionRegistry>,
}

impl RelayFrameUseCase {
    /// 新しい RelayFrameUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 受信フレームを解析して宛先へ中継
    ///
    /// # Arguments
    ///
    /// * `sender_id` - フレームを送ってきたクライアントの ID（ログ用）
    /// * `raw` - 受信したテキストフレーム
    ///
    /// # Returns
    ///
    /// * `Ok(RelayOutcome)` - 送信済み / キュー投入 / 破棄のいずれか
    /// * `Err(RelayError)` - フレームが不正、または宛先への送信失敗
    pub async fn execute(
        &self,
        sender_id: ClientId,
        raw: &str,
    ) -> Result<RelayOutcome, RelayError> {
        let frame = InboundFrame::parse(raw)?;
        let target_id = ClientId::new(frame.target_id())
            .map_err(|_| ProtocolError::InvalidTargetId(frame.target_id().to_string()))?;

        match frame {
            InboundFrame::Text { message, .. } => {
                let delivery = self.registry.deliver(message, target_id).await?;
                tracing::debug!(
                    "Relayed message from {} to {}: {:?}",
                    sender_id,
                    target_id,
                    delivery
                );
                Ok(RelayOutcome::Text {
                    target_id,
                    delivery,
                })
            }
            InboundFrame::File {
                file_type,
                file_data,
                ..
            } => {
                let delivery = self
                    .registry
                    .deliver_file(file_type, file_data, target_id)
                    .await?;
                tracing::debug!(
                    "Relayed file from {} to {}: {:?}",
                    sender_id,
                    target_id,
                    delivery
                );
                Ok(RelayOutcome::File {
                    target_id,
                    delivery,
                })
            }
        }
    }
}
