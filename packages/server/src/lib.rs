//! WebSocket message relay library.
//!
//! Clients connect on `/ws/{client_id}` and address text or files to other
//! client ids. Text for offline clients is queued in memory and flushed on
//! their next connection, within a retention window.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
