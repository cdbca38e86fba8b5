use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_common::id::prefix;
use taskhub_common::PrefixedId;
use utoipa::ToSchema;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Completed and cancelled tasks no longer get deadline notifications.
    pub fn is_closed(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }

    /// Ordering weight used when sorting by priority.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }
}

/// A task as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Creator of the task.
    pub assigned_by: String,
    pub assigned_to: Vec<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrefixedId for Task {
    const PREFIX: &'static str = prefix::TASK;
}

/// Validated input for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_by: String,
    pub assigned_to: Vec<String>,
    pub priority: Priority,
    pub due_date: DateTime<Utc>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
}

impl Task {
    pub fn new(input: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate(),
            title: input.title,
            description: input.description,
            assigned_by: input.assigned_by,
            assigned_to: input.assigned_to,
            priority: input.priority,
            status: TaskStatus::Pending,
            due_date: input.due_date,
            tags: input.tags,
            completed_at: None,
            estimated_hours: input.estimated_hours,
            actual_hours: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the task to `status`, stamping or clearing `completed_at`.
    ///
    /// Returns `true` if the status actually changed.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        if status == TaskStatus::Completed {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        true
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.assigned_by == user_id
    }

    pub fn is_assignee(&self, user_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == user_id)
    }

    /// Creator or assignee.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.is_creator(user_id) || self.is_assignee(user_id)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != TaskStatus::Completed
    }

    /// Whole days until the due date, rounded up. Negative once overdue.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.due_date - now).num_milliseconds();
        if ms > 0 {
            (ms + MS_PER_DAY - 1) / MS_PER_DAY
        } else {
            ms / MS_PER_DAY
        }
    }

    pub fn to_response(&self, now: DateTime<Utc>) -> TaskResponse {
        TaskResponse {
            task: self.clone(),
            is_overdue: self.is_overdue(now),
            days_until_due: self.days_until_due(now),
        }
    }
}

/// A task plus the fields derived from the current time.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub is_overdue: bool,
    pub days_until_due: i64,
}

/// Minimal task reference embedded in comment events.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskRef {
    pub id: String,
    pub title: String,
}

impl From<&Task> for TaskRef {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
        }
    }
}
