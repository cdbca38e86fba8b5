use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_common::id::prefix;
use taskhub_common::PrefixedId;
use utoipa::ToSchema;

/// Maximum length of a comment body after trimming.
pub const MAX_COMMENT_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: String,
    pub task_id: String,
    /// Author of the comment.
    pub user_id: String,
    pub comment: String,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrefixedId for TaskComment {
    const PREFIX: &'static str = prefix::COMMENT;
}

impl TaskComment {
    pub fn new(task_id: &str, user_id: &str, comment: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate(),
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
            comment: comment.to_string(),
            is_edited: false,
            edited_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the body. Edit tracking only flips when the text changes.
    pub fn edit(&mut self, comment: &str, now: DateTime<Utc>) {
        if self.comment != comment {
            self.comment = comment.to_string();
            self.is_edited = true;
            self.edited_at = Some(now);
        }
        self.updated_at = now;
    }
}
