//! Shared library for the Hikyaku relay server and client.
//!
//! - `protocol`: text frame grammar spoken over the WebSocket
//! - `time`: clock abstraction and timestamp helpers
//! - `logger`: tracing subscriber setup for the binaries

pub mod logger;
pub mod protocol;
pub mod time;
