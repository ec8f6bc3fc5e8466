//! Domain error types.

use thiserror::Error;

use super::ClientId;

/// Client id validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientIdError {
    /// Not a base-10 unsigned integer
    #[error("client id '{0}' is not a number")]
    NotANumber(String),

    /// Client ids start at 1
    #[error("client id must be a positive integer")]
    Zero,
}

/// Registry operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The target's connection went away while a frame was being pushed to it
    #[error("connection to client {0} is closed")]
    TransportFailure(ClientId),
}
