//! Socket event names, wire-format envelope, and typed payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::comment::TaskComment;
use crate::models::task::{TaskRef, TaskResponse, TaskStatus};

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// A frame sent from the server to a client: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayMessage {
    pub event: ServerEvent,
    pub data: Value,
}

impl GatewayMessage {
    pub fn new(event: ServerEvent, data: Value) -> Self {
        Self { event, data }
    }
}

// ---------------------------------------------------------------------------
// Server → Client event kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServerEvent {
    #[serde(rename = "getOnlineUsers")]
    OnlineUsers,
    #[serde(rename = "taskCreated")]
    TaskCreated,
    #[serde(rename = "taskUpdated")]
    TaskUpdated,
    #[serde(rename = "taskDeleted")]
    TaskDeleted,
    #[serde(rename = "taskAssigned")]
    TaskAssigned,
    #[serde(rename = "taskStatusChanged")]
    TaskStatusChanged,
    #[serde(rename = "taskAssignmentNotification")]
    AssignmentNotification,
    #[serde(rename = "taskCommentAdded")]
    CommentAdded,
    #[serde(rename = "taskCommentUpdated")]
    CommentUpdated,
    #[serde(rename = "taskCommentDeleted")]
    CommentDeleted,
    #[serde(rename = "userTypingTaskComment")]
    TypingIndicator,
    #[serde(rename = "taskBulkUpdated")]
    BulkUpdated,
    #[serde(rename = "taskDueReminder")]
    DueReminder,
    #[serde(rename = "taskOverdue")]
    Overdue,
}

impl ServerEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerEvent::OnlineUsers => "getOnlineUsers",
            ServerEvent::TaskCreated => "taskCreated",
            ServerEvent::TaskUpdated => "taskUpdated",
            ServerEvent::TaskDeleted => "taskDeleted",
            ServerEvent::TaskAssigned => "taskAssigned",
            ServerEvent::TaskStatusChanged => "taskStatusChanged",
            ServerEvent::AssignmentNotification => "taskAssignmentNotification",
            ServerEvent::CommentAdded => "taskCommentAdded",
            ServerEvent::CommentUpdated => "taskCommentUpdated",
            ServerEvent::CommentDeleted => "taskCommentDeleted",
            ServerEvent::TypingIndicator => "userTypingTaskComment",
            ServerEvent::BulkUpdated => "taskBulkUpdated",
            ServerEvent::DueReminder => "taskDueReminder",
            ServerEvent::Overdue => "taskOverdue",
        }
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Client → Server events
// ---------------------------------------------------------------------------

/// A frame received from a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinTaskRoom(String),
    LeaveTaskRoom(String),
    JoinUserTasksRoom,
    LeaveUserTasksRoom,
    TaskStatusUpdate(StatusUpdatePayload),
    NotifyTaskAssignment(AssignmentRequestPayload),
    TaskCommentTyping(TypingPayload),
    BulkTaskUpdate(BulkUpdatePayload),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatePayload {
    pub task_id: String,
    pub status: TaskStatus,
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequestPayload {
    pub assigned_users: Vec<String>,
    pub task_title: String,
    pub assigned_by: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub task_id: String,
    pub user_name: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdatePayload {
    pub task_ids: Vec<String>,
    pub operation: String,
    pub updated_by: String,
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedPayload {
    pub task_id: String,
    pub status: TaskStatus,
    pub updated_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentNotificationPayload {
    pub message: String,
    pub assigned_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingIndicatorPayload {
    pub task_id: String,
    pub user_name: String,
    pub is_typing: bool,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdatedPayload {
    pub task_id: String,
    pub operation: String,
    pub updated_by: String,
    pub timestamp: DateTime<Utc>,
}

/// Used for both `taskAssigned` and `taskCreated`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskNoticePayload {
    pub task: TaskResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatedPayload {
    pub task: TaskResponse,
    pub updated_by: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeletedPayload {
    pub task_id: String,
    pub task_title: String,
    pub deleted_by: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentAddedPayload {
    pub comment: TaskComment,
    pub task: TaskRef,
    pub commenter: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentUpdatedPayload {
    pub comment: TaskComment,
    pub task: TaskRef,
    pub updater: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDeletedPayload {
    pub comment_id: String,
    pub task_id: String,
    pub task_title: String,
    pub deleter: String,
}

/// Used for both `taskDueReminder` and `taskOverdue`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlinePayload {
    pub task_id: String,
    pub task_title: String,
    pub due_date: DateTime<Utc>,
    pub message: String,
}
