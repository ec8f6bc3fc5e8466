//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    domain::ConnectionRegistry,
    usecase::{ConnectClientUseCase, DisconnectClientUseCase, RelayFrameUseCase},
};

use super::{
    handler::{health_check, list_clients, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket relay server
///
/// This struct encapsulates the server wiring and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::with_registry(registry);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    connect_client_usecase: Arc<ConnectClientUseCase>,
    /// RelayFrameUseCase（受信フレーム中継のユースケース）
    relay_frame_usecase: Arc<RelayFrameUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// ConnectionRegistry（HTTP API の参照用）
    registry: Arc<dyn ConnectionRegistry>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `connect_client_usecase` - UseCase for client connection
    /// * `relay_frame_usecase` - UseCase for relaying inbound frames
    /// * `disconnect_client_usecase` - UseCase for client disconnection
    /// * `registry` - Registry backing the read-only HTTP API
    pub fn new(
        connect_client_usecase: Arc<ConnectClientUseCase>,
        relay_frame_usecase: Arc<RelayFrameUseCase>,
        disconnect_client_usecase: Arc<DisconnectClientUseCase>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            connect_client_usecase,
            relay_frame_usecase,
            disconnect_client_usecase,
            registry,
        }
    }

    /// Create a Server whose use cases all share `registry`
    pub fn with_registry(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self::new(
            Arc::new(ConnectClientUseCase::new(registry.clone())),
            Arc::new(RelayFrameUseCase::new(registry.clone())),
            Arc::new(DisconnectClientUseCase::new(registry.clone())),
            registry,
        )
    }

    /// Build the router without binding a listener
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            connect_client_usecase: self.connect_client_usecase,
            relay_frame_usecase: self.relay_frame_usecase,
            disconnect_client_usecase: self.disconnect_client_usecase,
            registry: self.registry,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{client_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(health_check))
            .route("/api/health", get(health_check))
            .route("/api/clients", get(list_clients))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the WebSocket relay server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "WebSocket relay server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws/{{client_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
