//! Error types for the relay client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection was closed or failed
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// The server URL is malformed; retrying cannot help
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Input line is neither a command nor a valid frame
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Received file data is not valid base64
    #[error("Failed to decode file: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Reading or writing a local file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
