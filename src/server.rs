//! ChatServer acceptor
//!
//! Accepts TCP connections and spawns one router task per connection.
//! Owns the Registry that every task shares.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::SessionSettings;
use crate::registry::Registry;
use crate::router::handle_connection;

/// The chat relay server
///
/// Each instance has its own Registry, so several servers can run
/// side by side in one process.
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    settings: SessionSettings,
}

impl ChatServer {
    /// Create a server around an already bound listener
    pub fn new(listener: TcpListener, settings: SessionSettings) -> Self {
        Self {
            listener,
            registry: Arc::new(Registry::new()),
            settings,
        }
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared registry handle
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Run the accept loop
    ///
    /// Never returns: accept failures are logged and the loop continues.
    pub async fn run(self) {
        info!("ChatServer started");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New connection from {}", addr);
                    let registry = Arc::clone(&self.registry);
                    let settings = self.settings;

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry, settings).await {
                            error!("Connection {} ended with error: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
