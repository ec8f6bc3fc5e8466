//! HTTP API response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fixed message returned by the health endpoints
pub const HEALTH_MESSAGE: &str = "WebSocket server is running.";

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub message: String,
}

impl Default for HealthDto {
    fn default() -> Self {
        Self {
            message: HEALTH_MESSAGE.to_string(),
        }
    }
}

/// Live connections and pending queue sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientsDto {
    /// Connected client ids, ascending
    pub connected: Vec<u64>,
    /// Queued message count keyed by client id
    pub queued: BTreeMap<u64, usize>,
}
