//! Which socket session currently represents each online user.
//!
//! Presence is last-connect-wins: a user has at most one recorded session, and
//! a newer connection silently replaces the older one. A disconnect only clears
//! the entry if it still points at the disconnecting session, so a late
//! disconnect from a replaced session never evicts the newer one.

use std::collections::HashSet;

use dashmap::DashMap;

/// Thread-safe, DashMap-backed presence registry (`user_id -> session_id`).
#[derive(Default)]
pub struct PresenceRegistry {
    inner: DashMap<String, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `session_id` as the live session for `user_id`, overwriting any
    /// previous entry. Returns the replaced session id, if any.
    pub fn record_connection(&self, user_id: &str, session_id: &str) -> Option<String> {
        self.inner
            .insert(user_id.to_string(), session_id.to_string())
    }

    pub fn lookup(&self, user_id: &str) -> Option<String> {
        self.inner.get(user_id).map(|e| e.value().clone())
    }

    /// Remove `user_id`'s entry if it still points at `session_id`. Returns
    /// whether the user went offline.
    ///
    /// The compare and the removal happen under the same shard lock.
    pub fn remove_connection(&self, user_id: &str, session_id: &str) -> bool {
        self.inner
            .remove_if(user_id, |_, current| current == session_id)
            .is_some()
    }

    /// All user ids with a recorded session at call time.
    pub fn snapshot_connected_users(&self) -> HashSet<String> {
        self.inner.iter().map(|e| e.key().clone()).collect()
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.inner.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
