//! Line Chat Relay Library
//!
//! A newline-delimited TCP chat relay. Clients pick a username and
//! then exchange broadcast or direct (`@user text`) messages.
//!
//! # Features
//! - Username registration (duplicates rejected)
//! - Broadcast to every other online user
//! - Direct messages with sender echo
//! - Stream framing that tolerates batched and split lines
//! - Slow clients isolated behind bounded outbound queues
//!
//! # Architecture
//! - `Registry` is the only shared state: username -> `Session`, behind one mutex
//! - Each connection runs a `router` task that reads lines and dispatches them
//! - Each session has a writer task draining its outbound queue
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use line_chat_relay::{ChatServer, SessionSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     ChatServer::new(listener, SessionSettings::default()).run().await;
//! }
//! ```

pub mod config;
pub mod error;
pub mod framing;
pub mod message;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::{Config, SessionSettings};
pub use error::{AppError, SendError};
pub use framing::LineReader;
pub use message::{ClientLine, ServerMessage};
pub use registry::Registry;
pub use router::handle_connection;
pub use server::ChatServer;
pub use session::Session;
pub use types::SessionId;
