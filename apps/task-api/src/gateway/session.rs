//! Per-connection gateway session state.

use taskhub_common::id::{prefix, prefixed_ulid};

use super::rooms::RoomName;

/// State for a single socket connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySession {
    /// Unique session identifier (`gw_` prefixed ULID).
    pub session_id: String,
    /// User id supplied at handshake. Sessions without one never enter
    /// presence or a personal room.
    pub user_id: Option<String>,
}

impl GatewaySession {
    pub fn new(user_id: Option<String>) -> Self {
        Self::with_id(prefixed_ulid(prefix::GATEWAY), user_id)
    }

    pub fn with_id(session_id: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.filter(|id| !id.is_empty()),
        }
    }

    pub fn personal_room(&self) -> Option<RoomName> {
        self.user_id.as_deref().map(RoomName::personal)
    }

    pub fn user_tasks_room(&self) -> Option<RoomName> {
        self.user_id.as_deref().map(RoomName::user_tasks)
    }
}
