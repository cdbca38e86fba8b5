//! Task list filtering, sorting, and pagination.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::task::{Priority, Task, TaskStatus};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Items to skip for a 1-based `page`. Saturates, so a page past any
/// reachable offset is simply empty.
pub fn page_offset(page: usize, limit: usize) -> usize {
    page.max(1).saturating_sub(1).saturating_mul(limit)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    Any,
    Is(TaskStatus),
    NotCompleted,
}

/// Named due-date windows, anchored at the start of the current UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    /// Due before the start of today.
    Overdue,
    /// Due before the exact current instant.
    BeforeNow,
}

impl DueWindow {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(DueWindow::Today),
            "tomorrow" => Some(DueWindow::Tomorrow),
            "this-week" => Some(DueWindow::ThisWeek),
            "next-week" => Some(DueWindow::NextWeek),
            "overdue" => Some(DueWindow::Overdue),
            _ => None,
        }
    }

    fn contains(self, due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let today = start_of_day(now);
        let tomorrow = today + Duration::days(1);
        let week_end = today + Duration::days(7);
        match self {
            DueWindow::Today => due >= today && due < tomorrow,
            DueWindow::Tomorrow => due >= tomorrow && due < tomorrow + Duration::days(1),
            DueWindow::ThisWeek => due >= today && due <= week_end,
            DueWindow::NextWeek => due > week_end && due <= today + Duration::days(14),
            DueWindow::Overdue => due < today,
            DueWindow::BeforeNow => due < now,
        }
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Title,
    Status,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(SortKey::CreatedAt),
            "updatedAt" => Some(SortKey::UpdatedAt),
            "dueDate" => Some(SortKey::DueDate),
            "priority" => Some(SortKey::Priority),
            "title" => Some(SortKey::Title),
            "status" => Some(SortKey::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A fully-resolved list query.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    pub status: StatusFilter,
    pub priorities: Vec<Priority>,
    pub assigned_to: Vec<String>,
    pub assigned_by: Option<String>,
    /// Creator or assignee.
    pub involving: Option<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub due: Option<DueWindow>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: usize,
    pub limit: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::Any,
            priorities: Vec::new(),
            assigned_to: Vec::new(),
            assigned_by: None,
            involving: None,
            tags: Vec::new(),
            search: None,
            due: None,
            sort: SortKey::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TaskQuery {
    /// Restrict to overdue tasks. Like the `overdue` due-date window, this
    /// replaces any status filter with "not completed".
    pub fn overdue_only(&mut self, window: DueWindow) {
        self.due = Some(window);
        self.status = StatusFilter::NotCompleted;
    }

    pub fn set_page(&mut self, page: Option<usize>, limit: Option<usize>) {
        self.page = page.unwrap_or(1).max(1);
        self.limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    }

    pub fn offset(&self) -> usize {
        page_offset(self.page, self.limit)
    }

    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        let status_ok = match self.status {
            StatusFilter::Any => true,
            StatusFilter::Is(s) => task.status == s,
            StatusFilter::NotCompleted => task.status != TaskStatus::Completed,
        };
        if !status_ok {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if !self.assigned_to.is_empty()
            && !task.assigned_to.iter().any(|id| self.assigned_to.contains(id))
        {
            return false;
        }
        if let Some(by) = &self.assigned_by {
            if &task.assigned_by != by {
                return false;
            }
        }
        if let Some(user) = &self.involving {
            if !task.is_member(user) {
                return false;
            }
        }
        if !self.tags.is_empty() && !task.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        if let Some(window) = self.due {
            if !window.contains(task.due_date, now) {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
                || task.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ord = match self.sort {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortKey::DueDate => a.due_date.cmp(&b.due_date),
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

/// Per-status counts across every stored task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    #[serde(rename = "in-progress")]
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl TaskStats {
    pub fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_tasks: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, returned: usize, total: usize) -> Self {
        let offset = page_offset(page, limit);
        Self {
            current_page: page,
            total_pages: total.div_ceil(limit.max(1)),
            total_tasks: total,
            has_next: offset.saturating_add(returned) < total,
            has_prev: page > 1,
        }
    }
}
