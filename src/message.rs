//! Line protocol definitions
//!
//! Plain-text protocol: one command per newline-terminated line.
//! `ClientLine` classifies what a client sent, `ServerMessage`
//! renders everything the server writes back.

use std::fmt;

use crate::error::AppError;

/// Prompt written right after accept (no trailing newline)
pub const USERNAME_PROMPT: &str = "Enter your username: ";

/// Client → Server line
///
/// The sender is implied by the session the line arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// Deliver to every other online session
    Broadcast { text: String },
    /// Deliver to a single named session (`@target text`)
    Direct { target: String, text: String },
}

impl ClientLine {
    /// Classify a single line
    ///
    /// Surrounding whitespace is trimmed first; anything not starting
    /// with `@`, including an empty line, is a broadcast. Returns
    /// `InvalidPrivateFormat` for `@target` without a body.
    pub fn parse(line: &str) -> Result<Self, AppError> {
        let line = line.trim();

        let Some(rest) = line.strip_prefix('@') else {
            return Ok(ClientLine::Broadcast {
                text: line.to_string(),
            });
        };

        let (target, text) = rest
            .split_once(' ')
            .ok_or(AppError::InvalidPrivateFormat)?;

        Ok(ClientLine::Direct {
            target: target.to_string(),
            text: text.to_string(),
        })
    }
}

/// Server → Client message
///
/// `Display` yields the exact bytes put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Ask for a username
    Prompt,
    /// Broadcast from another session
    Chat { from: String, text: String },
    /// Direct message received
    Private { from: String, text: String },
    /// Confirmation echoed to the sender of a direct message
    PrivateEcho { to: String, text: String },
    /// Direct message target is not online
    UserNotFound,
    /// `@target` without a body
    InvalidPrivateFormat,
    /// Registration rejected
    UsernameTaken,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Prompt => f.write_str(USERNAME_PROMPT),
            ServerMessage::Chat { from, text } => writeln!(f, "{}: {}", from, text),
            ServerMessage::Private { from, text } => writeln!(f, "[Private] {}: {}", from, text),
            ServerMessage::PrivateEcho { to, text } => {
                writeln!(f, "[Private to {}]: {}", to, text)
            }
            ServerMessage::UserNotFound => f.write_str("User not found!\n"),
            ServerMessage::InvalidPrivateFormat => {
                f.write_str("Invalid private message format. Use: @username message\n")
            }
            ServerMessage::UsernameTaken => f.write_str("Username already taken!\n"),
        }
    }
}

impl ServerMessage {
    /// Notice sent to the offending client for a protocol error
    ///
    /// Fatal errors produce no notice; the connection is closed instead.
    pub fn from_error(err: &AppError) -> Option<Self> {
        match err {
            AppError::UserNotFound(_) => Some(ServerMessage::UserNotFound),
            AppError::InvalidPrivateFormat => Some(ServerMessage::InvalidPrivateFormat),
            AppError::UsernameTaken(_) => Some(ServerMessage::UsernameTaken),
            _ => None,
        }
    }
}
