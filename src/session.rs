//! Session struct definition
//!
//! Represents a registered client: its username and the outbound
//! queue drained by that connection's writer task.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::SessionId;

/// Registered client information
///
/// Cheap to clone; a clone is the handle other sessions use to
/// reach this client for the duration of one dispatch.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique identifier for this connection
    pub id: SessionId,
    /// Username, unique among active sessions
    pub username: String,
    /// Server → Client line queue
    sender: mpsc::Sender<String>,
}

impl Session {
    /// Create a new session with the given ID, username and queue
    pub fn new(id: SessionId, username: String, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            username,
            sender,
        }
    }

    /// Queue a message for this client
    ///
    /// Never waits: a full queue means the client is not keeping up
    /// and the message is dropped for this client only.
    pub fn send(&self, msg: &ServerMessage) -> Result<(), SendError> {
        self.send_raw(msg.to_string())
    }

    /// Queue an already-rendered line for this client
    pub fn send_raw(&self, line: String) -> Result<(), SendError> {
        self.sender.try_send(line).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
