//! Recipient sets for user-targeted notifications.
//!
//! An `Audience` is a set, so a user who is both creator and assignee of a
//! task is in it once and gets one event per mutation.

use std::collections::BTreeSet;

use crate::models::task::Task;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audience(BTreeSet<String>);

impl Audience {
    /// The task's assignees.
    pub fn assignees(task: &Task) -> Self {
        task.assigned_to.iter().cloned().collect()
    }

    /// Creator plus assignees.
    pub fn task_members(task: &Task) -> Self {
        let mut audience = Self::assignees(task);
        audience.insert(&task.assigned_by);
        audience
    }

    /// Drop `user_id` from the set. Used for comment events, which never go
    /// back to the user who caused them.
    pub fn excluding(mut self, user_id: &str) -> Self {
        self.0.remove(user_id);
        self
    }

    pub fn insert(&mut self, user_id: &str) -> bool {
        self.0.insert(user_id.to_string())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Audience {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
