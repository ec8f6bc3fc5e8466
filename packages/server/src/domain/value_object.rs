//! Value objects.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::ClientIdError;

/// Identifier of one logical relay user.
///
/// Positive integer taken from the connection path. Ownership is not verified:
/// whoever presents an id is that client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClientId(u64);

impl ClientId {
    /// Create a new ClientId, rejecting zero
    pub fn new(value: u64) -> Result<Self, ClientIdError> {
        if value == 0 {
            return Err(ClientIdError::Zero);
        }
        Ok(Self(value))
    }

    /// Raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ClientId {
    type Error = ClientIdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ClientId {
    type Error = ClientIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = value
            .trim()
            .parse::<u64>()
            .map_err(|_| ClientIdError::NotANumber(value.to_string()))?;
        Self::new(parsed)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one accepted transport connection.
///
/// Two connections presenting the same [`ClientId`] get different ConnectionIds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a random ConnectionId (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Timestamp `millis` earlier, saturating at `i64::MIN`
    pub fn saturating_sub_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}
