//! Message formatting utilities for client display.

use std::path::Path;

use hikyaku_shared::time::timestamp_to_rfc3339;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render a timestamp, falling back to the raw millis when out of range
    fn format_timestamp(millis: i64) -> String {
        timestamp_to_rfc3339(millis).unwrap_or_else(|| millis.to_string())
    }

    /// Format a text frame pushed by the server
    ///
    /// # Arguments
    ///
    /// * `text` - The frame as received
    /// * `received_at` - Unix timestamp when the frame arrived (milliseconds)
    pub fn format_incoming_message(text: &str, received_at: i64) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             {}\n\
             received at {}\n\
             ------------------------------------------------------------\n",
            text,
            Self::format_timestamp(received_at)
        )
    }

    /// Format a confirmation after a frame has been written to the socket
    pub fn format_sent_confirmation(target_id: u64, sent_at: i64) -> String {
        format!(
            "sent to {} at {}\n",
            target_id,
            Self::format_timestamp(sent_at)
        )
    }

    /// Format a notification for a file saved to disk
    pub fn format_file_saved(path: &Path, size: usize) -> String {
        format!("\n← Received file ({} bytes) saved to {}\n", size, path.display())
    }

    /// Format the command reference shown by `/help`
    pub fn format_help() -> String {
        "\nCommands:\n\
         \x20 <target_id>:<message>     send a text message\n\
         \x20 /file <target_id> <path>  send a file\n\
         \x20 /help                     show this help\n\
         \x20 /quit                     exit\n"
            .to_string()
    }

    /// Format a local error without leaving the prompt
    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }
}
