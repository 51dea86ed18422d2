//! Per-connection router
//!
//! Handles individual client connections: username handshake,
//! line parsing, and dispatch of broadcast and direct messages
//! through the shared Registry.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SessionSettings;
use crate::error::AppError;
use crate::framing::LineReader;
use crate::message::{ClientLine, ServerMessage};
use crate::registry::Registry;
use crate::session::Session;
use crate::types::SessionId;

/// Handle a new connection
///
/// Prompts for a username, registers it, then routes every line the
/// client sends until the stream closes. The session is removed from
/// the registry on every exit path once registered.
pub async fn handle_connection<S>(
    stream: S,
    registry: Arc<Registry>,
    settings: SessionSettings,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut lines = LineReader::new(read_half);

    let session_id = SessionId::new();
    let (msg_tx, msg_rx) = mpsc::channel::<String>(settings.outbound_buffer);

    let Some(me) = register_username(
        &mut lines,
        &mut write_half,
        &registry,
        session_id,
        msg_tx,
        settings.write_timeout,
    )
    .await?
    else {
        debug!("Connection {} closed before registering", session_id);
        return Ok(());
    };

    info!("{} joined the chat", me.username);

    let mut write_task = tokio::spawn(write_loop(write_half, msg_rx, settings.write_timeout));
    let mut writer_done = false;

    let result = tokio::select! {
        res = read_loop(&mut lines, &me, &registry) => res,
        res = &mut write_task => {
            writer_done = true;
            match res {
                Ok(res) => res,
                Err(e) => Err(io::Error::other(e).into()),
            }
        }
    };

    registry.unregister_session(me.id, &me.username).await;
    let username = me.username.clone();
    drop(me);

    // Let queued lines reach the client before the stream is closed
    if !writer_done
        && tokio::time::timeout(settings.write_timeout, &mut write_task)
            .await
            .is_err()
    {
        write_task.abort();
    }

    info!("{} disconnected", username);

    result
}

/// Prompt until the client picks a free username
///
/// Returns `None` if the stream closes first.
async fn register_username<R, W>(
    lines: &mut LineReader<R>,
    writer: &mut W,
    registry: &Registry,
    id: SessionId,
    sender: mpsc::Sender<String>,
    write_timeout: Duration,
) -> Result<Option<Session>, AppError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        write_line(writer, &ServerMessage::Prompt.to_string(), write_timeout).await?;

        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };

        let session = Session::new(id, line.trim().to_string(), sender.clone());
        match registry.register(session.clone()).await {
            Ok(()) => return Ok(Some(session)),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("Registration rejected for {}: {}", id, e);
                if let Some(notice) = ServerMessage::from_error(&e) {
                    write_line(writer, &notice.to_string(), write_timeout).await?;
                }
            }
        }
    }
}

/// Route lines until the client disconnects
async fn read_loop<R>(
    lines: &mut LineReader<R>,
    me: &Session,
    registry: &Registry,
) -> Result<(), AppError>
where
    R: AsyncRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        match dispatch(&line, me, registry).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("Protocol error from {}: {}", me.username, e);
                if let Some(notice) = ServerMessage::from_error(&e) {
                    deliver(me, &notice);
                }
            }
        }
    }
    Ok(())
}

/// Classify one line from `me` and deliver it
///
/// Protocol errors are returned for the caller to report back to the
/// sender; delivery failures to other clients are only logged.
pub async fn dispatch(line: &str, me: &Session, registry: &Registry) -> Result<(), AppError> {
    match ClientLine::parse(line)? {
        ClientLine::Broadcast { text } => {
            let chat = ServerMessage::Chat {
                from: me.username.clone(),
                text,
            };
            let delivered = registry.broadcast(&chat.to_string(), &me.username).await;
            debug!("{} broadcast to {} sessions", me.username, delivered);
        }
        ClientLine::Direct { target, text } => {
            let Some(recipient) = registry.lookup(&target).await else {
                return Err(AppError::UserNotFound(target));
            };

            deliver(
                &recipient,
                &ServerMessage::Private {
                    from: me.username.clone(),
                    text: text.clone(),
                },
            );
            deliver(me, &ServerMessage::PrivateEcho { to: target, text });
        }
    }

    Ok(())
}

fn deliver(session: &Session, msg: &ServerMessage) {
    if let Err(e) = session.send(msg) {
        warn!("Delivery to '{}' failed: {}", session.username, e);
    }
}

/// Drain the outbound queue into the client's stream
async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::Receiver<String>,
    write_timeout: Duration,
) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = queue.recv().await {
        write_line(&mut writer, &line, write_timeout).await?;
    }
    let _ = writer.shutdown().await;
    Ok(())
}

async fn write_line<W>(writer: &mut W, line: &str, write_timeout: Duration) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    };

    match tokio::time::timeout(write_timeout, write).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(AppError::WriteTimeout),
    }
}
