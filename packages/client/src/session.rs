//! WebSocket client session management.

use std::path::PathBuf;

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use hikyaku_shared::{
    protocol::{InboundFrame, OutboundFrame},
    time::get_utc_timestamp,
};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    command::{Command, parse_command},
    error::ClientError,
    files::{FileAssembler, encode_file},
    formatter::MessageFormatter,
    ui::redisplay_prompt,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Settings shared by every session of one client process
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base WebSocket URL, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub client_id: u64,
    /// Where received files are written
    pub download_dir: PathBuf,
}

impl SessionConfig {
    /// URL of this client's endpoint: `{url}/{client_id}`
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.client_id)
    }
}

/// Run one WebSocket client session.
///
/// Returns `Ok(())` when the user quits (`/quit`, Ctrl+C or Ctrl+D) and an
/// error when the connection cannot be established or is lost.
pub async fn run_client_session(
    config: &SessionConfig,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let endpoint = config.endpoint();
    let (ws_stream, _response) = connect_async(&endpoint).await.map_err(|e| match e {
        tungstenite::Error::Url(e) => ClientError::InvalidUrl(e.to_string()),
        e => ClientError::ConnectionError(e.to_string()),
    })?;

    tracing::info!("Connected to relay server at {}", endpoint);
    println!(
        "\nYou are client {}. Type <target_id>:<message> or /help. Press Ctrl+C to exit.\n",
        config.client_id
    );

    let (mut write, read) = ws_stream.split();
    let mut read_task = tokio::spawn(read_loop(
        read,
        config.client_id,
        FileAssembler::new(config.download_dir.clone()),
    ));

    let result = loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // Input thread ended (Ctrl+C / Ctrl+D)
                    write.send(Message::Close(None)).await.ok();
                    break Ok(());
                };
                match handle_line(&line, &mut write).await {
                    Ok(true) => {}
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }
                redisplay_prompt(config.client_id);
            }
            reason = &mut read_task => {
                let reason = reason.unwrap_or_else(|e| e.to_string());
                break Err(ClientError::ConnectionLost(reason));
            }
        }
    };

    read_task.abort();
    result
}

/// Handle one input line. Returns `Ok(false)` when the session should end.
async fn handle_line(
    line: &str,
    write: &mut SplitSink<WsStream, Message>,
) -> Result<bool, ClientError> {
    let frame = match parse_command(line) {
        Ok(Command::Quit) => {
            write.send(Message::Close(None)).await.ok();
            return Ok(false);
        }
        Ok(Command::Help) => {
            print!("{}", MessageFormatter::format_help());
            return Ok(true);
        }
        Ok(Command::Send(frame)) => frame,
        Ok(Command::SendFile { target_id, path }) => match encode_file(target_id, &path).await {
            Ok(frame) => frame,
            Err(e) => {
                print!(
                    "{}",
                    MessageFormatter::format_error(&format!("{}: {}", path.display(), e))
                );
                return Ok(true);
            }
        },
        Err(e) => {
            print!("{}", MessageFormatter::format_error(&e.to_string()));
            return Ok(true);
        }
    };

    send_frame(write, &frame).await?;
    print!(
        "{}",
        MessageFormatter::format_sent_confirmation(frame.target_id(), get_utc_timestamp())
    );
    Ok(true)
}

async fn send_frame(
    write: &mut SplitSink<WsStream, Message>,
    frame: &InboundFrame,
) -> Result<(), ClientError> {
    write
        .send(Message::Text(frame.to_string().into()))
        .await
        .map_err(|e| ClientError::ConnectionLost(e.to_string()))
}

/// Print or save every frame pushed by the server until the connection ends.
///
/// Returns the reason the connection ended.
async fn read_loop(
    mut read: SplitStream<WsStream>,
    client_id: u64,
    mut assembler: FileAssembler,
) -> String {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_frame(text.as_str(), &mut assembler).await;
                redisplay_prompt(client_id);
            }
            Ok(Message::Close(_)) => {
                tracing::info!("Server closed the connection");
                return "closed by server".to_string();
            }
            Err(e) => {
                tracing::warn!("WebSocket read error: {}", e);
                return e.to_string();
            }
            // Binary frames are not part of the protocol; ping/pong is automatic
            Ok(_) => {}
        }
    }
    "stream ended".to_string()
}

async fn handle_frame(raw: &str, assembler: &mut FileAssembler) {
    match OutboundFrame::classify(raw) {
        OutboundFrame::FileHeader {
            file_type,
            file_data,
        } => {
            if assembler.begin(file_type, file_data) {
                tracing::warn!("File header received before EOF; previous file discarded");
            }
        }
        OutboundFrame::EndOfFile => match assembler.finish(get_utc_timestamp()).await {
            Ok(Some(saved)) => {
                print!(
                    "{}",
                    MessageFormatter::format_file_saved(&saved.path, saved.size)
                );
            }
            Ok(None) => tracing::warn!("EOF received without a file header"),
            Err(e) => print!(
                "{}",
                MessageFormatter::format_error(&format!("Received file was not saved: {}", e))
            ),
        },
        OutboundFrame::Text(text) => {
            print!(
                "{}",
                MessageFormatter::format_incoming_message(text, get_utc_timestamp())
            );
        }
    }
}
