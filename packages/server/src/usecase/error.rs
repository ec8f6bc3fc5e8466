//! UseCase error types.

use hikyaku_shared::protocol::ProtocolError;
use thiserror::Error;

use crate::domain::RegistryError;

/// Errors while registering a new connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Queued messages could not be pushed to the new connection
    #[error("failed to flush queued messages: {0}")]
    FlushFailed(#[from] RegistryError),
}

/// Errors while relaying one inbound frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Frame does not follow the wire grammar
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] ProtocolError),

    /// Target's connection failed while sending
    #[error("delivery failed: {0}")]
    Delivery(#[from] RegistryError),
}
