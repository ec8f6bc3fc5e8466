//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::ClientId,
    ui::state::AppState,
    usecase::{RelayError, RelayOutcome},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(raw_client_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> ClientId (Domain Model)
    let client_id = match ClientId::try_from(raw_client_id.as_str()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Rejecting connection for '{}': {}", raw_client_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, client_id)))
}

/// Spawns a task that drains the connection's channel into the WebSocket sender.
///
/// When the registry drops the channel (disconnect or replacement by a newer
/// connection), a close frame is sent and the task ends.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.into())).await {
                tracing::debug!("Failed to write frame: {}", e);
                return;
            }
        }
        if let Err(e) = sender.send(Message::Close(None)).await {
            tracing::debug!("Failed to send close frame: {}", e);
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, client_id: ClientId) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this client to receive frames
    let (tx, rx) = mpsc::unbounded_channel();

    // Register and flush queued messages into the channel before the writer starts
    let connection_id = match state.connect_client_usecase.execute(client_id, tx).await {
        Ok((connection_id, outcome)) => {
            tracing::info!(
                "Client {} connected (connection {}, replaced previous: {})",
                client_id,
                connection_id,
                outcome.replaced
            );
            connection_id
        }
        Err(e) => {
            tracing::warn!("Failed to register client {}: {}", client_id, e);
            return;
        }
    };

    let mut send_task = pusher_loop(rx, sender);

    // Spawn a task to receive frames from this client
    let relay_frame_usecase = state.relay_frame_usecase.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from client {}: {}", client_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    match relay_frame_usecase.execute(client_id, text.as_str()).await {
                        Ok(RelayOutcome::Text {
                            target_id,
                            delivery,
                        }) => {
                            tracing::info!(
                                "Message from {} to {}: {:?}",
                                client_id,
                                target_id,
                                delivery
                            );
                        }
                        Ok(RelayOutcome::File {
                            target_id,
                            delivery,
                        }) => {
                            tracing::info!(
                                "File from {} to {}: {:?}",
                                client_id,
                                target_id,
                                delivery
                            );
                        }
                        Err(e @ RelayError::MalformedFrame(_)) => {
                            tracing::warn!("Ignoring frame from client {}: {}", client_id, e);
                        }
                        Err(RelayError::Delivery(e)) => {
                            tracing::warn!("Frame from client {} not delivered: {}", client_id, e);
                        }
                    }
                }
                Message::Binary(data) => {
                    tracing::debug!(
                        "Ignoring binary frame ({} bytes) from client {}",
                        data.len(),
                        client_id
                    );
                }
                Message::Close(_) => {
                    tracing::info!("Client {} requested close", client_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    match state
        .disconnect_client_usecase
        .execute(client_id, connection_id)
        .await
    {
        Some(report) => {
            tracing::info!(
                "Client {} disconnected; departure notice sent to {} client(s)",
                client_id,
                report.delivered.len()
            );
        }
        None => {
            tracing::info!(
                "Connection {} of client {} closed after being replaced",
                connection_id,
                client_id
            );
        }
    }
}
