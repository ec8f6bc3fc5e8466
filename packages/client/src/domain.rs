//! Domain logic for client-side operations.
//!
//! Pure functions deciding how the runner reacts to a finished session.

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// Only connection failures are worth retrying.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    !matches!(
        error,
        ClientError::ConnectionError(_) | ClientError::ConnectionLost(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The number of consecutive failed attempts so far
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Check if the failed session had been connected before it ended.
///
/// A lost connection starts a fresh series of attempts.
pub fn was_connected(error: &ClientError) -> bool {
    matches!(error, ClientError::ConnectionLost(_))
}
