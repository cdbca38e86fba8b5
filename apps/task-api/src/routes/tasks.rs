//! Task endpoints. Every successful mutation notifies the affected users
//! after the store write; failed requests return before anything is sent.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::AuthUser;
use crate::db::contacts::{check_assignees, AssigneeProblem, Contact};
use crate::db::store::TaskStore;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::gateway::audience::Audience;
use crate::gateway::events::{
    ServerEvent, StatusChangedPayload, TaskDeletedPayload, TaskNoticePayload, TaskUpdatedPayload,
};
use crate::gateway::rooms::RoomName;
use crate::models::filter::{
    DueWindow, Pagination, SortKey, SortOrder, StatusFilter, TaskQuery, TaskStats, MAX_PAGE_SIZE,
};
use crate::models::task::{NewTask, Priority, Task, TaskResponse, TaskStatus};
use crate::AppState;

use super::{Envelope, MessageResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/tags", get(list_tags))
        .route("/tasks/chat-users", get(list_chat_users))
        .route("/tasks/user/{user_id}", get(list_user_tasks))
        .route(
            "/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{task_id}/assign", put(assign_task))
}

const TITLE_LEN: (usize, usize) = (3, 200);
const DESCRIPTION_LEN: (usize, usize) = (10, 2000);
const MAX_TAG_LEN: usize = 50;
const MAX_HOURS: f64 = 1000.0;

pub(crate) async fn load_task(store: &dyn TaskStore, task_id: &str) -> Result<Task, ApiError> {
    store
        .get_task(task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

// ---------------------------------------------------------------------------
// Field validation
// ---------------------------------------------------------------------------

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_title(title: &str, errors: &mut Vec<FieldError>) {
    let len = char_len(title);
    if len < TITLE_LEN.0 || len > TITLE_LEN.1 {
        errors.push(FieldError::new("title", "Title must be between 3 and 200 characters"));
    }
}

fn check_description(description: &str, errors: &mut Vec<FieldError>) {
    let len = char_len(description);
    if len < DESCRIPTION_LEN.0 || len > DESCRIPTION_LEN.1 {
        errors.push(FieldError::new(
            "description",
            "Description must be between 10 and 2000 characters",
        ));
    }
}

fn check_hours(field: &str, label: &str, hours: Option<f64>, errors: &mut Vec<FieldError>) {
    if let Some(h) = hours {
        if !(0.0..=MAX_HOURS).contains(&h) {
            errors.push(FieldError::new(field, format!("{label} must be between 0 and 1000")));
        }
    }
}

fn check_tags(tags: &[String], errors: &mut Vec<FieldError>) -> Vec<String> {
    if tags.iter().any(|t| t.trim().is_empty()) {
        errors.push(FieldError::new("tags", "All tags must be non-empty strings"));
    } else if tags.iter().any(|t| char_len(t.trim()) > MAX_TAG_LEN) {
        errors.push(FieldError::new("tags", "Tags cannot exceed 50 characters"));
    }
    tags.iter().map(|t| t.trim().to_string()).collect()
}

fn check_priority(value: &str, errors: &mut Vec<FieldError>) -> Option<Priority> {
    let parsed = Priority::parse(value);
    if parsed.is_none() {
        errors.push(FieldError::new(
            "priority",
            "Priority must be one of: low, medium, high, urgent",
        ));
    }
    parsed
}

/// Accepts RFC 3339 timestamps or a bare `YYYY-MM-DD` (midnight UTC).
fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn check_due_date(value: &str, now: DateTime<Utc>, errors: &mut Vec<FieldError>) -> Option<DateTime<Utc>> {
    match parse_due_date(value) {
        None => {
            errors.push(FieldError::new("dueDate", "Due date must be a valid date"));
            None
        }
        Some(due) if due <= now => {
            errors.push(FieldError::new("dueDate", "Due date must be in the future"));
            None
        }
        Some(due) => Some(due),
    }
}

/// Drop repeated ids, keeping first-seen order.
fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

async fn ensure_assignable(
    state: &AppState,
    caller: &str,
    assignees: &[String],
    unknown_message: &str,
) -> Result<(), ApiError> {
    match check_assignees(state.contacts.as_ref(), caller, assignees).await? {
        None => Ok(()),
        Some(AssigneeProblem::NotAContact) => Err(ApiError::bad_request(
            "You can only assign tasks to people you have chatted with",
        )),
        Some(AssigneeProblem::UnknownUser) => Err(ApiError::bad_request(unknown_message)),
    }
}

// ---------------------------------------------------------------------------
// GET /api/tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTasksParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    /// A status, or `all`.
    pub status: Option<String>,
    /// Comma-separated priorities.
    pub priority: Option<String>,
    /// Comma-separated user ids.
    pub assigned_to: Option<String>,
    pub assigned_by: Option<String>,
    /// Comma-separated tags.
    pub tags: Option<String>,
    pub search: Option<String>,
    /// today, tomorrow, this-week, next-week or overdue.
    pub due_date: Option<String>,
    pub overdue: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn comma_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_page(
    page: Option<&str>,
    limit: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> (Option<usize>, Option<usize>) {
    let page = page.map(|p| match p.parse::<usize>() {
        Ok(n) if n >= 1 => n,
        _ => {
            errors.push(FieldError::new("page", "Page must be a positive integer"));
            1
        }
    });
    let limit = limit.map(|l| match l.parse::<usize>() {
        Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
        _ => {
            errors.push(FieldError::new("limit", "Limit must be between 1 and 100"));
            1
        }
    });
    (page, limit)
}

fn parse_status_filter(value: Option<&str>, errors: &mut Vec<FieldError>) -> StatusFilter {
    match value {
        None | Some("all") => StatusFilter::Any,
        Some(s) => match TaskStatus::parse(s) {
            Some(status) => StatusFilter::Is(status),
            None => {
                errors.push(FieldError::new("status", "Invalid status filter"));
                StatusFilter::Any
            }
        },
    }
}

impl ListTasksParams {
    fn into_query(self) -> Result<TaskQuery, ApiError> {
        let mut errors = Vec::new();
        let mut query = TaskQuery {
            status: parse_status_filter(self.status.as_deref(), &mut errors),
            ..TaskQuery::default()
        };

        for p in comma_list(self.priority.as_deref()) {
            match Priority::parse(&p) {
                Some(priority) => query.priorities.push(priority),
                None => {
                    errors.push(FieldError::new("priority", "Invalid priority filter"));
                    break;
                }
            }
        }
        query.assigned_to = comma_list(self.assigned_to.as_deref());
        query.assigned_by = self.assigned_by.filter(|s| !s.is_empty());
        query.tags = comma_list(self.tags.as_deref());
        query.search = self.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if let Some(window) = self.due_date.as_deref() {
            match DueWindow::parse(window) {
                Some(DueWindow::Overdue) => query.overdue_only(DueWindow::Overdue),
                Some(w) => query.due = Some(w),
                None => errors.push(FieldError::new("dueDate", "Invalid due date filter")),
            }
        }
        match self.overdue.as_deref() {
            None | Some("false") => {}
            Some("true") => query.overdue_only(DueWindow::BeforeNow),
            Some(_) => errors.push(FieldError::new("overdue", "Overdue must be a boolean")),
        }

        if let Some(key) = self.sort_by.as_deref() {
            match SortKey::parse(key) {
                Some(k) => query.sort = k,
                None => errors.push(FieldError::new("sortBy", "Invalid sort field")),
            }
        }
        match self.sort_order.as_deref() {
            None | Some("desc") => query.order = SortOrder::Desc,
            Some("asc") => query.order = SortOrder::Asc,
            Some(_) => errors.push(FieldError::new("sortOrder", "Sort order must be asc or desc")),
        }

        let (page, limit) = parse_page(self.page.as_deref(), self.limit.as_deref(), &mut errors);
        query.set_page(page, limit);

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(query)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListData {
    pub tasks: Vec<TaskResponse>,
    /// Status counts over all tasks; `total` is the filtered count.
    pub stats: TaskStats,
    pub pagination: Pagination,
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Tasks",
    security(("user_id" = [])),
    params(ListTasksParams),
    responses(
        (status = 200, description = "Filtered task page", body = Envelope<TaskListData>),
        (status = 400, description = "Invalid filter", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_tasks(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<Envelope<TaskListData>>, ApiError> {
    let query = params.into_query()?;
    let now = Utc::now();

    let page = state.store.list_tasks(&query, now).await?;
    let mut stats = state.store.status_counts().await?;
    stats.total = page.total;

    let pagination = Pagination::new(query.page, query.limit, page.tasks.len(), page.total);
    let tasks = page.tasks.iter().map(|t| t.to_response(now)).collect();

    Ok(Envelope::ok(TaskListData {
        tasks,
        stats,
        pagination,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/tasks/tags
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/tasks/tags",
    tag = "Tasks",
    security(("user_id" = [])),
    responses(
        (status = 200, description = "Distinct tags", body = Envelope<Vec<String>>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_tags(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<String>>>, ApiError> {
    Ok(Envelope::ok(state.store.distinct_tags().await?))
}

// ---------------------------------------------------------------------------
// GET /api/tasks/chat-users
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/tasks/chat-users",
    tag = "Tasks",
    security(("user_id" = [])),
    responses(
        (status = 200, description = "Users the caller may assign", body = Envelope<Vec<Contact>>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_chat_users(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<Contact>>>, ApiError> {
    let contacts = state.contacts.chat_contacts(&user_id).await?;
    Ok(Envelope::with_message(contacts, "Chat users retrieved successfully"))
}

// ---------------------------------------------------------------------------
// GET /api/tasks/user/{user_id}
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserTasksParams {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserTasksData {
    pub tasks: Vec<TaskResponse>,
    pub pagination: Pagination,
}

#[utoipa::path(
    get,
    path = "/api/tasks/user/{user_id}",
    tag = "Tasks",
    security(("user_id" = [])),
    params(
        ("user_id" = String, Path, description = "User ID"),
        UserTasksParams,
    ),
    responses(
        (status = 200, description = "Tasks created by or assigned to the user", body = Envelope<UserTasksData>),
        (status = 400, description = "Invalid filter", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_user_tasks(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<UserTasksParams>,
) -> Result<Json<Envelope<UserTasksData>>, ApiError> {
    let mut errors = Vec::new();
    let mut query = TaskQuery {
        status: parse_status_filter(params.status.as_deref(), &mut errors),
        involving: Some(user_id),
        ..TaskQuery::default()
    };
    let (page, limit) = parse_page(params.page.as_deref(), params.limit.as_deref(), &mut errors);
    query.set_page(page, limit);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let now = Utc::now();
    let page = state.store.list_tasks(&query, now).await?;
    let pagination = Pagination::new(query.page, query.limit, page.tasks.len(), page.total);
    let tasks = page.tasks.iter().map(|t| t.to_response(now)).collect();

    Ok(Envelope::ok(UserTasksData { tasks, pagination }))
}

// ---------------------------------------------------------------------------
// GET /api/tasks/{task_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}",
    tag = "Tasks",
    security(("user_id" = [])),
    params(("task_id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task", body = Envelope<TaskResponse>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 404, description = "Task not found", body = ApiErrorBody),
    ),
)]
pub async fn get_task(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Envelope<TaskResponse>>, ApiError> {
    let task = load_task(state.store.as_ref(), &task_id).await?;
    Ok(Envelope::ok(task.to_response(Utc::now())))
}

// ---------------------------------------------------------------------------
// POST /api/tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Vec<String>>,
    /// Defaults to `medium`.
    pub priority: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`; must be in the future.
    pub due_date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
}

impl CreateTaskRequest {
    fn validate(self, creator: &str, now: DateTime<Utc>) -> Result<NewTask, ApiError> {
        let mut errors = Vec::new();

        let title = self.title.unwrap_or_default().trim().to_string();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else {
            check_title(&title, &mut errors);
        }

        let description = self.description.unwrap_or_default().trim().to_string();
        if description.is_empty() {
            errors.push(FieldError::new("description", "Description is required"));
        } else {
            check_description(&description, &mut errors);
        }

        let assigned_to = dedup_ids(self.assigned_to.unwrap_or_default());
        if assigned_to.is_empty() {
            errors.push(FieldError::new("assignedTo", "At least one person must be assigned"));
        }

        let priority = match self.priority.as_deref() {
            None => Some(Priority::default()),
            Some(p) => check_priority(p, &mut errors),
        };

        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("dueDate", "Due date is required"));
                None
            }
            Some(d) => check_due_date(d, now, &mut errors),
        };

        let tags = check_tags(&self.tags.unwrap_or_default(), &mut errors);
        check_hours("estimatedHours", "Estimated hours", self.estimated_hours, &mut errors);

        match (priority, due_date) {
            (Some(priority), Some(due_date)) if errors.is_empty() => Ok(NewTask {
                title,
                description,
                assigned_by: creator.to_string(),
                assigned_to,
                priority,
                due_date,
                tags,
                estimated_hours: self.estimated_hours,
            }),
            _ => Err(ApiError::validation(errors)),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "Tasks",
    security(("user_id" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Envelope<TaskResponse>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn create_task(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Envelope<TaskResponse>>), ApiError> {
    let now = Utc::now();
    let input = body.validate(&user_id, now)?;
    ensure_assignable(&state, &user_id, &input.assigned_to, "One or more assigned users not found")
        .await?;

    let task = state.store.insert_task(Task::new(input, now)).await?;
    let response = task.to_response(now);

    tracing::info!(task_id = %task.id, user_id = %user_id, "task created");

    state.gateway.notify_users(
        &Audience::assignees(&task),
        ServerEvent::TaskAssigned,
        &TaskNoticePayload {
            task: response.clone(),
            message: format!("You have been assigned a new task: {}", task.title),
        },
    );
    state.gateway.notify_room(
        &RoomName::user_tasks(&user_id),
        ServerEvent::TaskCreated,
        &TaskNoticePayload {
            task: response.clone(),
            message: format!("Task \"{}\" has been created", task.title),
        },
    );

    Ok((
        StatusCode::CREATED,
        Envelope::with_message(response, "Task created successfully"),
    ))
}

// ---------------------------------------------------------------------------
// PUT /api/tasks/{task_id}
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Vec<String>>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Parsed and validated subset of an update request.
#[derive(Debug, Default)]
struct TaskChanges {
    title: Option<String>,
    description: Option<String>,
    assigned_to: Option<Vec<String>>,
    priority: Option<Priority>,
    status: Option<TaskStatus>,
    due_date: Option<DateTime<Utc>>,
    tags: Option<Vec<String>>,
    estimated_hours: Option<f64>,
    actual_hours: Option<f64>,
}

impl UpdateTaskRequest {
    fn validate(self, now: DateTime<Utc>) -> Result<TaskChanges, ApiError> {
        let mut errors = Vec::new();
        let mut changes = TaskChanges::default();

        if let Some(title) = self.title {
            let title = title.trim().to_string();
            check_title(&title, &mut errors);
            changes.title = Some(title);
        }
        if let Some(description) = self.description {
            let description = description.trim().to_string();
            check_description(&description, &mut errors);
            changes.description = Some(description);
        }
        if let Some(ids) = self.assigned_to {
            let ids = dedup_ids(ids);
            if ids.is_empty() {
                errors.push(FieldError::new("assignedTo", "At least one person must be assigned"));
            }
            changes.assigned_to = Some(ids);
        }
        if let Some(p) = self.priority.as_deref() {
            changes.priority = check_priority(p, &mut errors);
        }
        if let Some(s) = self.status.as_deref() {
            changes.status = TaskStatus::parse(s);
            if changes.status.is_none() {
                errors.push(FieldError::new(
                    "status",
                    "Status must be one of: pending, in-progress, completed, cancelled",
                ));
            }
        }
        if let Some(d) = self.due_date.as_deref() {
            changes.due_date = check_due_date(d.trim(), now, &mut errors);
        }
        if let Some(tags) = self.tags {
            changes.tags = Some(check_tags(&tags, &mut errors));
        }
        check_hours("estimatedHours", "Estimated hours", self.estimated_hours, &mut errors);
        check_hours("actualHours", "Actual hours", self.actual_hours, &mut errors);
        changes.estimated_hours = self.estimated_hours;
        changes.actual_hours = self.actual_hours;

        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }
        Ok(changes)
    }
}

impl TaskChanges {
    /// Apply to `task`. Returns whether the status changed.
    fn apply(self, task: &mut Task, now: DateTime<Utc>) -> bool {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(ids) = self.assigned_to {
            task.assigned_to = ids;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if self.estimated_hours.is_some() {
            task.estimated_hours = self.estimated_hours;
        }
        if self.actual_hours.is_some() {
            task.actual_hours = self.actual_hours;
        }
        task.updated_at = now;
        match self.status {
            Some(status) => task.set_status(status, now),
            None => false,
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    tag = "Tasks",
    security(("user_id" = [])),
    params(("task_id" = String, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Envelope<TaskResponse>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not a member of the task", body = ApiErrorBody),
        (status = 404, description = "Task not found", body = ApiErrorBody),
    ),
)]
pub async fn update_task(
    AuthUser { user_id, name }: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<Envelope<TaskResponse>>, ApiError> {
    let now = Utc::now();
    let changes = body.validate(now)?;

    let previous = load_task(state.store.as_ref(), &task_id).await?;
    if !previous.is_member(&user_id) {
        return Err(ApiError::forbidden("Not authorized to update this task"));
    }
    if let Some(ids) = &changes.assigned_to {
        ensure_assignable(&state, &user_id, ids, "One or more assigned users not found").await?;
    }

    let due_moved = changes.due_date.is_some_and(|d| d != previous.due_date);
    let mut task = previous.clone();
    let status_changed = changes.apply(&mut task, now);
    let task = state.store.save_task(task).await?;
    let response = task.to_response(now);

    if due_moved {
        state.reminders.forget(&task.id);
    }

    tracing::info!(task_id = %task.id, user_id = %user_id, status_changed, "task updated");

    state.gateway.notify_users(
        &Audience::task_members(&previous),
        ServerEvent::TaskUpdated,
        &TaskUpdatedPayload {
            task: response.clone(),
            updated_by: name.clone(),
            message: format!("Task \"{}\" has been updated", previous.title),
        },
    );
    if status_changed {
        state.gateway.notify_room(
            &RoomName::task(&task.id),
            ServerEvent::TaskStatusChanged,
            &StatusChangedPayload {
                task_id: task.id.clone(),
                status: task.status,
                updated_by: name,
                timestamp: now,
            },
        );
    }

    Ok(Envelope::with_message(response, "Task updated successfully"))
}

// ---------------------------------------------------------------------------
// DELETE /api/tasks/{task_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    tag = "Tasks",
    security(("user_id" = [])),
    params(("task_id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task and its comments deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the creator", body = ApiErrorBody),
        (status = 404, description = "Task not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_task(
    AuthUser { user_id, name }: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let task = load_task(state.store.as_ref(), &task_id).await?;
    if !task.is_creator(&user_id) {
        return Err(ApiError::forbidden("Only the task creator can delete this task"));
    }

    if !state.store.delete_task(&task.id).await? {
        return Err(ApiError::not_found("Task not found"));
    }
    state.reminders.forget(&task.id);

    tracing::info!(task_id = %task.id, user_id = %user_id, "task deleted");

    state.gateway.notify_users(
        &Audience::task_members(&task),
        ServerEvent::TaskDeleted,
        &TaskDeletedPayload {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            deleted_by: name,
            message: format!("Task \"{}\" has been deleted", task.title),
        },
    );

    Ok(MessageResponse::ok("Task deleted successfully"))
}

// ---------------------------------------------------------------------------
// PUT /api/tasks/{task_id}/assign
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    /// Replaces the current assignee list.
    pub user_ids: Option<Vec<String>>,
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}/assign",
    tag = "Tasks",
    security(("user_id" = [])),
    params(("task_id" = String, Path, description = "Task ID")),
    request_body = AssignTaskRequest,
    responses(
        (status = 200, description = "Assignees replaced", body = Envelope<TaskResponse>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the creator", body = ApiErrorBody),
        (status = 404, description = "Task not found", body = ApiErrorBody),
    ),
)]
pub async fn assign_task(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(body): Json<AssignTaskRequest>,
) -> Result<Json<Envelope<TaskResponse>>, ApiError> {
    let user_ids = dedup_ids(body.user_ids.unwrap_or_default());
    if user_ids.is_empty() {
        return Err(ApiError::bad_request("At least one user ID is required"));
    }

    let mut task = load_task(state.store.as_ref(), &task_id).await?;
    if !task.is_creator(&user_id) {
        return Err(ApiError::forbidden("Only the task creator can reassign this task"));
    }
    ensure_assignable(&state, &user_id, &user_ids, "One or more users not found").await?;

    let now = Utc::now();
    task.assigned_to = user_ids;
    task.updated_at = now;
    let task = state.store.save_task(task).await?;
    let response = task.to_response(now);

    tracing::info!(task_id = %task.id, user_id = %user_id, assignees = task.assigned_to.len(), "task reassigned");

    state.gateway.notify_users(
        &Audience::assignees(&task),
        ServerEvent::TaskAssigned,
        &TaskNoticePayload {
            task: response.clone(),
            message: format!("You have been assigned to task: {}", task.title),
        },
    );

    Ok(Envelope::with_message(response, "Task assigned successfully"))
}
