//! Live socket sessions and their outbound queues.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::events::GatewayMessage;

/// Sending half of a session's outbound queue. The socket task owns the
/// receiver and writes frames in queue order.
pub type SessionSender = mpsc::UnboundedSender<Arc<GatewayMessage>>;

struct SessionEntry {
    user_id: Option<String>,
    sender: SessionSender,
    connected_at: Instant,
}

/// Shared registry of all connected sessions (`session_id -> queue`).
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session after the handshake.
    pub fn register(&self, session_id: &str, user_id: Option<String>, sender: SessionSender) {
        let entry = SessionEntry {
            user_id,
            sender,
            connected_at: Instant::now(),
        };
        self.sessions.insert(session_id.to_string(), entry);
    }

    /// Forget a session. Returns `false` if it was not registered.
    pub fn unregister(&self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, entry)) => {
                tracing::debug!(
                    session_id,
                    user_id = entry.user_id.as_deref().unwrap_or("-"),
                    connected_for_ms = entry.connected_at.elapsed().as_millis() as u64,
                    "session unregistered"
                );
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Enqueue a frame for one session. Returns `false` if the session is
    /// unknown or its socket task has already gone away.
    pub fn send(&self, session_id: &str, msg: Arc<GatewayMessage>) -> bool {
        match self.sessions.get(session_id) {
            Some(entry) => entry.sender.send(msg).is_ok(),
            None => false,
        }
    }

    /// Enqueue a frame for every session. Returns how many accepted it.
    pub fn send_all(&self, msg: &Arc<GatewayMessage>) -> usize {
        self.sessions
            .iter()
            .filter(|e| e.value().sender.send(msg.clone()).is_ok())
            .count()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
