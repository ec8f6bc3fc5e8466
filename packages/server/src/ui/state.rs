//! Server state shared by the handlers.

use std::sync::Arc;

use crate::{
    domain::ConnectionRegistry,
    usecase::{ConnectClientUseCase, DisconnectClientUseCase, RelayFrameUseCase},
};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// RelayFrameUseCase（受信フレーム中継のユースケース）
    pub relay_frame_usecase: Arc<RelayFrameUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// Read-only access for the HTTP API
    pub registry: Arc<dyn ConnectionRegistry>,
}
