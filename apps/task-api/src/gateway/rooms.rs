//! Named broadcast rooms and the sessions subscribed to them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKind {
    /// Direct pushes to one user. Joined at handshake, left at disconnect.
    Personal,
    /// "This user's task list changed". Joined and left by the client.
    UserTasks,
    /// Viewers of one task.
    Task,
}

/// Canonical room identity. Two components naming the same (kind, key) always
/// get equal values; different kinds never compare equal even for equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomName {
    Personal(String),
    UserTasks(String),
    Task(String),
}

impl RoomName {
    pub fn new(kind: RoomKind, key: &str) -> Self {
        match kind {
            RoomKind::Personal => RoomName::Personal(key.to_string()),
            RoomKind::UserTasks => RoomName::UserTasks(key.to_string()),
            RoomKind::Task => RoomName::Task(key.to_string()),
        }
    }

    pub fn personal(user_id: &str) -> Self {
        Self::new(RoomKind::Personal, user_id)
    }

    pub fn user_tasks(user_id: &str) -> Self {
        Self::new(RoomKind::UserTasks, user_id)
    }

    pub fn task(task_id: &str) -> Self {
        Self::new(RoomKind::Task, task_id)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomName::Personal(k) => write!(f, "user:{k}"),
            RoomName::UserTasks(k) => write!(f, "user_tasks:{k}"),
            RoomName::Task(k) => write!(f, "task:{k}"),
        }
    }
}

#[derive(Default)]
struct RoomIndex {
    members: HashMap<RoomName, HashSet<String>>,
    memberships: HashMap<String, HashSet<RoomName>>,
}

/// Two-way index of room membership.
///
/// Both directions live behind one `parking_lot::Mutex` so every operation
/// updates them together.
#[derive(Default)]
pub struct RoomRegistry {
    inner: Mutex<RoomIndex>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `session_id` to `room`. Returns `false` if it was already a member.
    pub fn join(&self, session_id: &str, room: RoomName) -> bool {
        let mut idx = self.inner.lock();
        let added = idx
            .members
            .entry(room.clone())
            .or_default()
            .insert(session_id.to_string());
        idx.memberships
            .entry(session_id.to_string())
            .or_default()
            .insert(room);
        added
    }

    /// Remove `session_id` from `room`. Returns `false` if it was not a member.
    pub fn leave(&self, session_id: &str, room: &RoomName) -> bool {
        let mut idx = self.inner.lock();
        let removed = match idx.members.get_mut(room) {
            Some(set) => {
                let removed = set.remove(session_id);
                if set.is_empty() {
                    idx.members.remove(room);
                }
                removed
            }
            None => false,
        };
        if let Some(rooms) = idx.memberships.get_mut(session_id) {
            rooms.remove(room);
            if rooms.is_empty() {
                idx.memberships.remove(session_id);
            }
        }
        removed
    }

    /// Remove `session_id` from every room. Returns the rooms it was in.
    pub fn drop_session(&self, session_id: &str) -> Vec<RoomName> {
        let mut idx = self.inner.lock();
        let rooms: Vec<RoomName> = idx
            .memberships
            .remove(session_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for room in &rooms {
            if let Some(set) = idx.members.get_mut(room) {
                set.remove(session_id);
                if set.is_empty() {
                    idx.members.remove(room);
                }
            }
        }
        rooms
    }

    /// Sessions currently in `room`. Unknown rooms are simply empty.
    pub fn members_of(&self, room: &RoomName) -> HashSet<String> {
        self.inner
            .lock()
            .members
            .get(room)
            .cloned()
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, session_id: &str) -> HashSet<RoomName> {
        self.inner
            .lock()
            .memberships
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.inner.lock().members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn room_names_are_deterministic_and_kind_scoped() {
        assert_eq!(RoomName::task("t1"), RoomName::new(RoomKind::Task, "t1"));
        assert_ne!(RoomName::personal("x"), RoomName::user_tasks("x"));
        assert_ne!(RoomName::personal("tasks_x"), RoomName::user_tasks("x"));
        assert_eq!(RoomName::user_tasks("u1").to_string(), "user_tasks:u1");
        assert_eq!(RoomName::personal("u1").to_string(), "user:u1");
    }

    #[test]
    fn join_is_idempotent() {
        let rooms = RoomRegistry::new();
        let room = RoomName::task("t1");

        assert!(rooms.join("s1", room.clone()));
        let once = rooms.members_of(&room);
        assert!(!rooms.join("s1", room.clone()));
        assert_eq!(rooms.members_of(&room), once);
        assert_eq!(once, set(&["s1"]));
    }

    #[test]
    fn leave_not_joined_is_noop() {
        let rooms = RoomRegistry::new();
        assert!(!rooms.leave("s1", &RoomName::task("t1")));

        rooms.join("s2", RoomName::task("t1"));
        assert!(!rooms.leave("s1", &RoomName::task("t1")));
        assert_eq!(rooms.members_of(&RoomName::task("t1")), set(&["s2"]));
    }

    #[test]
    fn leave_removes_both_directions() {
        let rooms = RoomRegistry::new();
        let room = RoomName::task("t1");
        rooms.join("s1", room.clone());

        assert!(rooms.leave("s1", &room));
        assert!(rooms.members_of(&room).is_empty());
        assert!(rooms.rooms_of("s1").is_empty());
        assert_eq!(rooms.room_count(), 0);
    }

    #[test]
    fn drop_session_leaves_every_room() {
        let rooms = RoomRegistry::new();
        rooms.join("s1", RoomName::personal("u1"));
        rooms.join("s1", RoomName::user_tasks("u1"));
        rooms.join("s1", RoomName::task("t1"));
        rooms.join("s1", RoomName::task("t2"));
        rooms.join("s2", RoomName::task("t1"));

        let left = rooms.drop_session("s1");
        assert_eq!(left.len(), 4);
        assert!(rooms.rooms_of("s1").is_empty());
        for room in [
            RoomName::personal("u1"),
            RoomName::user_tasks("u1"),
            RoomName::task("t1"),
            RoomName::task("t2"),
        ] {
            assert!(!rooms.members_of(&room).contains("s1"));
        }
        assert_eq!(rooms.members_of(&RoomName::task("t1")), set(&["s2"]));
        assert_eq!(rooms.room_count(), 1);
    }

    #[test]
    fn drop_unknown_session_is_empty() {
        let rooms = RoomRegistry::new();
        assert!(rooms.drop_session("ghost").is_empty());
    }

    #[test]
    fn members_of_unknown_room_is_empty() {
        let rooms = RoomRegistry::new();
        assert!(rooms.members_of(&RoomName::task("nope")).is_empty());
    }
}
