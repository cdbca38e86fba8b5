//! Notification fan-out: resolves users and rooms to live sessions and
//! enqueues typed events for them.
//!
//! Delivery is at-most-once and fire-and-forget. Offline users, empty rooms,
//! and closed sockets are normal outcomes, not errors; nothing is buffered for
//! later. Every `notify_*` method returns how many sessions accepted the event.

use std::sync::Arc;

use serde::Serialize;

use super::audience::Audience;
use super::events::{GatewayMessage, ServerEvent};
use super::presence::PresenceRegistry;
use super::registry::{SessionRegistry, SessionSender};
use super::rooms::{RoomName, RoomRegistry};
use super::session::GatewaySession;

/// Process-wide socket state. One instance lives in `AppState`; tests build
/// their own.
#[derive(Default)]
pub struct Fanout {
    presence: PresenceRegistry,
    rooms: RoomRegistry,
    sessions: SessionRegistry,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Register a freshly handshaken session, bind it to presence and its
    /// personal room, and broadcast the new online-user list.
    pub fn connect(&self, session: &GatewaySession, sender: SessionSender) {
        self.sessions
            .register(&session.session_id, session.user_id.clone(), sender);

        if let Some(user_id) = session.user_id.as_deref() {
            if let Some(replaced) = self.presence.record_connection(user_id, &session.session_id) {
                tracing::debug!(
                    user_id,
                    session_id = %session.session_id,
                    replaced_session = %replaced,
                    "newer session took over presence"
                );
            }
        }
        if let Some(room) = session.personal_room() {
            self.rooms.join(&session.session_id, room);
        }

        self.broadcast_online_users();
    }

    /// Tear down a session: leave all rooms, clear presence if it still
    /// points here, drop the outbound queue, and rebroadcast online users.
    pub fn disconnect(&self, session: &GatewaySession) {
        let left = self.rooms.drop_session(&session.session_id);
        let went_offline = session
            .user_id
            .as_deref()
            .is_some_and(|user_id| self.presence.remove_connection(user_id, &session.session_id));
        self.sessions.unregister(&session.session_id);

        tracing::debug!(
            session_id = %session.session_id,
            rooms_left = left.len(),
            went_offline,
            "session torn down"
        );

        self.broadcast_online_users();
    }

    /// Join a room on behalf of a connected session. Unknown sessions are
    /// ignored so memberships never outlive their session.
    pub fn join_room(&self, session_id: &str, room: RoomName) -> bool {
        if !self.sessions.contains(session_id) {
            return false;
        }
        self.rooms.join(session_id, room)
    }

    pub fn leave_room(&self, session_id: &str, room: &RoomName) -> bool {
        self.rooms.leave(session_id, room)
    }

    // -----------------------------------------------------------------------
    // Delivery primitives
    // -----------------------------------------------------------------------

    /// Send to each user's current session. Users without one are skipped.
    pub fn notify_users<P: Serialize>(
        &self,
        audience: &Audience,
        event: ServerEvent,
        payload: &P,
    ) -> usize {
        if audience.is_empty() {
            return 0;
        }
        let Some(msg) = encode(event, payload) else {
            return 0;
        };
        let delivered = audience
            .iter()
            .filter_map(|user_id| self.presence.lookup(user_id))
            .filter(|session_id| self.sessions.send(session_id, msg.clone()))
            .count();

        tracing::debug!(%event, audience = audience.len(), delivered, "notified users");
        delivered
    }

    /// Send to every session in `room`.
    pub fn notify_room<P: Serialize>(&self, room: &RoomName, event: ServerEvent, payload: &P) -> usize {
        self.deliver_to_room(room, None, event, payload)
    }

    /// Send to every session in `room` except `sender_session`, for events
    /// relayed from one client to the others viewing the same task.
    pub fn notify_room_except<P: Serialize>(
        &self,
        room: &RoomName,
        sender_session: &str,
        event: ServerEvent,
        payload: &P,
    ) -> usize {
        self.deliver_to_room(room, Some(sender_session), event, payload)
    }

    /// Send to every connected session.
    pub fn notify_all_connected<P: Serialize>(&self, event: ServerEvent, payload: &P) -> usize {
        match encode(event, payload) {
            Some(msg) => self.sessions.send_all(&msg),
            None => 0,
        }
    }

    /// Push the current presence snapshot to everyone.
    pub fn broadcast_online_users(&self) -> usize {
        let mut online: Vec<String> = self
            .presence
            .snapshot_connected_users()
            .into_iter()
            .collect();
        online.sort();
        self.notify_all_connected(ServerEvent::OnlineUsers, &online)
    }

    fn deliver_to_room<P: Serialize>(
        &self,
        room: &RoomName,
        skip: Option<&str>,
        event: ServerEvent,
        payload: &P,
    ) -> usize {
        let members = self.rooms.members_of(room);
        if members.is_empty() {
            return 0;
        }
        let Some(msg) = encode(event, payload) else {
            return 0;
        };
        let delivered = members
            .iter()
            .filter(|session_id| Some(session_id.as_str()) != skip)
            .filter(|session_id| self.sessions.send(session_id, msg.clone()))
            .count();

        tracing::debug!(%event, %room, delivered, "notified room");
        delivered
    }
}

fn encode<P: Serialize>(event: ServerEvent, payload: &P) -> Option<Arc<GatewayMessage>> {
    match serde_json::to_value(payload) {
        Ok(data) => Some(Arc::new(GatewayMessage::new(event, data))),
        Err(err) => {
            tracing::error!(?err, %event, "failed to encode event payload");
            None
        }
    }
}
