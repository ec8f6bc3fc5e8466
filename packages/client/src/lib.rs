//! CLI client for the Hikyaku relay.
//!
//! Reads commands from an interactive prompt, sends text and file frames, and
//! saves files pushed by the server.

pub mod command;
pub mod domain;
pub mod error;
pub mod files;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
