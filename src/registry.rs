//! Session registry
//!
//! The authoritative set of who is online: username -> Session.
//! Every access goes through a single mutex; no socket I/O ever
//! happens while it is held.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::session::Session;
use crate::types::SessionId;

/// Shared username -> Session mapping
///
/// Meant to be wrapped in an `Arc` and handed to the acceptor and to
/// every connection task. Independent instances do not see each other.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its username
    ///
    /// Fails with `UsernameTaken` if another session already holds the
    /// name; the existing entry is left untouched.
    pub async fn register(&self, session: Session) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;

        if sessions.contains_key(&session.username) {
            return Err(AppError::UsernameTaken(session.username));
        }

        debug!("Registered '{}' ({})", session.username, session.id);
        sessions.insert(session.username.clone(), session);
        Ok(())
    }

    /// Remove a username if present
    ///
    /// Idempotent. Returns whether an entry was removed.
    pub async fn unregister(&self, username: &str) -> bool {
        self.sessions.lock().await.remove(username).is_some()
    }

    /// Remove a username only if it still belongs to the given session
    pub async fn unregister_session(&self, id: SessionId, username: &str) -> bool {
        let mut sessions = self.sessions.lock().await;

        match sessions.get(username) {
            Some(session) if session.id == id => {
                sessions.remove(username);
                true
            }
            _ => false,
        }
    }

    /// Get a handle to the session registered under `username`
    pub async fn lookup(&self, username: &str) -> Option<Session> {
        self.sessions.lock().await.get(username).cloned()
    }

    /// Queue `line` for every session except `exclude`
    ///
    /// The recipient list is snapshotted under the lock and delivery
    /// happens after it is released. A failing recipient is logged and
    /// skipped. Returns how many recipients accepted the line.
    pub async fn broadcast(&self, line: &str, exclude: &str) -> usize {
        let recipients: Vec<Session> = {
            let sessions = self.sessions.lock().await;
            sessions
                .values()
                .filter(|s| s.username != exclude)
                .cloned()
                .collect()
        };

        let mut delivered = 0;
        for recipient in &recipients {
            match recipient.send_raw(line.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Broadcast to '{}' failed: {}", recipient.username, e),
            }
        }
        delivered
    }

    /// Number of online sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Check if nobody is online
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Sorted list of online usernames
    pub async fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn session(name: &str, capacity: usize) -> (Session, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Session::new(SessionId::new(), name.to_string(), tx), rx)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = Registry::new();
        let (alice, _alice_rx) = session("alice", 8);
        let (bob, _bob_rx) = session("bob", 8);
        let alice_id = alice.id;
        let bob_id = bob.id;

        registry.register(alice).await.unwrap();
        registry.register(bob).await.unwrap();

        assert_eq!(registry.lookup("alice").await.map(|s| s.id), Some(alice_id));
        assert_eq!(registry.lookup("bob").await.map(|s| s.id), Some(bob_id));
        assert!(registry.lookup("carol").await.is_none());
        assert_eq!(registry.usernames().await, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let registry = Registry::new();
        let (first, _first_rx) = session("alice", 8);
        let (second, _second_rx) = session("alice", 8);
        let first_id = first.id;

        registry.register(first).await.unwrap();
        let err = registry.register(second).await.unwrap_err();

        assert!(matches!(err, AppError::UsernameTaken(name) if name == "alice"));
        assert_eq!(registry.lookup("alice").await.map(|s| s.id), Some(first_id));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unregister_idempotent() {
        let registry = Registry::new();
        let (alice, _rx) = session("alice", 8);
        registry.register(alice).await.unwrap();

        assert!(registry.unregister("alice").await);
        assert!(!registry.unregister("alice").await);
        assert!(!registry.unregister("never-there").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregister_session_checks_owner() {
        let registry = Registry::new();
        let (alice, _rx) = session("alice", 8);
        let alice_id = alice.id;
        registry.register(alice).await.unwrap();

        assert!(!registry.unregister_session(SessionId::new(), "alice").await);
        assert!(registry.lookup("alice").await.is_some());

        assert!(registry.unregister_session(alice_id, "alice").await);
        assert!(registry.lookup("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_excludes_sender() {
        let registry = Registry::new();
        let (a, mut a_rx) = session("A", 8);
        let (b, mut b_rx) = session("B", 8);
        let (c, mut c_rx) = session("C", 8);
        registry.register(a).await.unwrap();
        registry.register(b).await.unwrap();
        registry.register(c).await.unwrap();

        let delivered = registry.broadcast("A: hi\n", "A").await;

        assert_eq!(delivered, 2);
        assert_eq!(b_rx.recv().await.as_deref(), Some("A: hi\n"));
        assert_eq!(c_rx.recv().await.as_deref(), Some("A: hi\n"));
        assert!(a_rx.try_recv().is_err());
        assert!(b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_isolates_failing_recipient() {
        let registry = Registry::new();
        let (full, _full_rx) = session("slow", 1);
        let (closed, closed_rx) = session("gone", 8);
        let (ok, mut ok_rx) = session("ok", 8);
        full.send_raw("backlog\n".to_string()).unwrap();
        drop(closed_rx);
        registry.register(full).await.unwrap();
        registry.register(closed).await.unwrap();
        registry.register(ok).await.unwrap();

        let delivered = registry.broadcast("x: hello\n", "x").await;

        assert_eq!(delivered, 1);
        assert_eq!(ok_rx.recv().await.as_deref(), Some("x: hello\n"));
    }

    #[tokio::test]
    async fn test_broadcast_skips_unregistered() {
        let registry = Registry::new();
        let (a, _a_rx) = session("A", 8);
        let (b, mut b_rx) = session("B", 8);
        registry.register(a).await.unwrap();
        registry.register(b).await.unwrap();

        registry.unregister("B").await;

        assert_eq!(registry.broadcast("A: hi\n", "A").await, 0);
        assert!(b_rx.try_recv().is_err());
    }
}
