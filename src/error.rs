//! Error types for the chat relay
//!
//! Defines session-level errors and outbound queue errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Session-level errors
///
/// Covers both fatal errors (the session ends) and
/// protocol errors (a notice is written back to the sender).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the client's stream (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Incoming line exceeded the framing limit (fatal)
    #[error("Line exceeds {0} bytes")]
    LineTooLong(usize),

    /// Writing to the client did not finish in time (fatal)
    #[error("Write timed out")]
    WriteTimeout,

    /// Username already belongs to an active session
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Direct message target is not online
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Direct message without a body
    #[error("Invalid private message format")]
    InvalidPrivateFormat,
}

impl AppError {
    /// Whether this error ends the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Io(_) | AppError::LineTooLong(_) | AppError::WriteTimeout
        )
    }
}

/// Outbound queue errors
///
/// Occurs when a line cannot be enqueued for a session's writer task.
#[derive(Debug, Error)]
pub enum SendError {
    /// The writer task has stopped (client disconnected)
    #[error("Channel closed")]
    ChannelClosed,

    /// The recipient is not draining its queue fast enough
    #[error("Outbound queue full")]
    QueueFull,
}
