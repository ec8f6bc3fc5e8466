//! Text frame grammar spoken between relay clients and the server.
//!
//! Inbound (client to server):
//!
//! ```text
//! <targetId>:<message>                       plain message, split on the first colon
//! FILE:<fileType>:<targetId>:<fileData>      file, fileData keeps any further colons
//! ```
//!
//! Outbound (server to client):
//!
//! ```text
//! <message>                                  plain message, no envelope
//! FILE:<fileType>:<fileData>  then  EOF      file, always two frames
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Prefix marking a file frame in both directions
pub const FILE_PREFIX: &str = "FILE:";

/// Sentinel frame sent after an outbound file frame
pub const EOF_FRAME: &str = "EOF";

const DELIMITER: char = ':';

/// Reasons an inbound frame does not follow the grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Plain message without a `:` between target and message
    #[error("missing ':' delimiter between target id and message")]
    MissingDelimiter,

    /// File frame with fewer than four `:`-separated fields
    #[error("file frame needs 4 fields (FILE:<type>:<target>:<data>), got {0}")]
    MissingFileFields(usize),

    /// Target id is not a positive integer
    #[error("invalid target id '{0}'")]
    InvalidTargetId(String),
}

/// A frame received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Text message addressed to `target_id`
    Text { target_id: u64, message: String },
    /// File payload addressed to `target_id`; `file_data` is opaque (usually base64)
    File {
        file_type: String,
        target_id: u64,
        file_data: String,
    },
}

impl InboundFrame {
    /// Parse one inbound frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use hikyaku_shared::protocol::InboundFrame;
    ///
    /// let frame = InboundFrame::parse("42:hello:world").unwrap();
    /// assert_eq!(
    ///     frame,
    ///     InboundFrame::Text { target_id: 42, message: "hello:world".to_string() }
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.starts_with(FILE_PREFIX) {
            let fields: Vec<&str> = raw.splitn(4, DELIMITER).collect();
            let [_, file_type, target, file_data] = fields[..] else {
                return Err(ProtocolError::MissingFileFields(fields.len()));
            };
            return Ok(Self::File {
                file_type: file_type.to_string(),
                target_id: parse_target_id(target)?,
                file_data: file_data.to_string(),
            });
        }

        let (target, message) = raw
            .split_once(DELIMITER)
            .ok_or(ProtocolError::MissingDelimiter)?;
        Ok(Self::Text {
            target_id: parse_target_id(target)?,
            message: message.to_string(),
        })
    }

    /// Client id the frame is addressed to
    pub fn target_id(&self) -> u64 {
        match self {
            Self::Text { target_id, .. } | Self::File { target_id, .. } => *target_id,
        }
    }
}

impl FromStr for InboundFrame {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InboundFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { target_id, message } => write!(f, "{}:{}", target_id, message),
            Self::File {
                file_type,
                target_id,
                file_data,
            } => write!(f, "{}{}:{}:{}", FILE_PREFIX, file_type, target_id, file_data),
        }
    }
}

/// A frame received from the server, as seen by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame<'a> {
    /// First frame of a file transfer
    FileHeader { file_type: &'a str, file_data: &'a str },
    /// Terminates the preceding file transfer
    EndOfFile,
    /// Anything else is a plain message
    Text(&'a str),
}

impl<'a> OutboundFrame<'a> {
    /// Classify a raw frame sent by the server
    pub fn classify(raw: &'a str) -> Self {
        if raw == EOF_FRAME {
            return Self::EndOfFile;
        }
        if let Some(rest) = raw.strip_prefix(FILE_PREFIX)
            && let Some((file_type, file_data)) = rest.split_once(DELIMITER)
        {
            return Self::FileHeader {
                file_type,
                file_data,
            };
        }
        Self::Text(raw)
    }
}

/// Parse a target id field: surrounding whitespace is ignored, zero is rejected.
pub fn parse_target_id(raw: &str) -> Result<u64, ProtocolError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ProtocolError::InvalidTargetId(raw.to_string())),
    }
}

/// Header frame of an outbound file transfer (followed by [`EOF_FRAME`])
pub fn outbound_file_frame(file_type: &str, file_data: &str) -> String {
    format!("{}{}:{}", FILE_PREFIX, file_type, file_data)
}

/// Notice broadcast to every remaining client when `client_id` disconnects.
///
/// The wording is English; earlier relays of this protocol sent a Spanish
/// notice (`Usuario <id> ha salido del chat.`), so clients treat it as plain text.
pub fn departure_notice(client_id: u64) -> String {
    format!("Client {} has left the chat.", client_id)
}
