//! Line Chat Relay - Entry Point
//!
//! Parses configuration, binds the TCP listener and runs the acceptor.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat_relay::{ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("line_chat_relay=info")),
        )
        .init();

    let config = Config::parse();

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Chat server listening on {}", listener.local_addr()?);

    ChatServer::new(listener, config.session_settings()).run().await;

    Ok(())
}
