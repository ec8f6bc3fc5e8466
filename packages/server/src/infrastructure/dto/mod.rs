//! Data Transfer Objects (DTOs) for the relay server.
//!
//! WebSocket frames are plain text (see `hikyaku_shared::protocol`), so only
//! the HTTP API carries structured payloads.

pub mod conversion;
pub mod http;
