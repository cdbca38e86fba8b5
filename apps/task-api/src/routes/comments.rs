//! Task comment endpoints. Comment notifications go to the task's creator and
//! assignees, never back to the user who made the change.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::gateway::audience::Audience;
use crate::gateway::events::{
    CommentAddedPayload, CommentDeletedPayload, CommentUpdatedPayload, ServerEvent,
};
use crate::models::comment::{TaskComment, MAX_COMMENT_LEN};
use crate::models::filter::MAX_PAGE_SIZE;
use crate::models::task::TaskRef;
use crate::AppState;

use super::tasks::load_task;
use super::{Envelope, MessageResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks/{task_id}/comments", get(list_comments).post(add_comment))
        .route(
            "/tasks/comments/{comment_id}",
            put(update_comment).delete(delete_comment),
        )
}

const DEFAULT_COMMENT_PAGE: usize = 20;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub comment: Option<String>,
}

impl CommentRequest {
    /// Trimmed comment text, or a validation error.
    fn text(self) -> Result<String, ApiError> {
        let text = self.comment.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(ApiError::bad_request("Comment is required"));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(ApiError::validation(vec![FieldError::new(
                "comment",
                "Comment must be between 1 and 1000 characters",
            )]));
        }
        Ok(text)
    }
}

async fn load_comment(state: &AppState, comment_id: &str) -> Result<TaskComment, ApiError> {
    state
        .store
        .get_comment(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))
}

// ---------------------------------------------------------------------------
// GET /api/tasks/{task_id}/comments
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCommentsParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_comments: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentListData {
    pub comments: Vec<TaskComment>,
    pub pagination: CommentPagination,
}

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}/comments",
    tag = "Comments",
    security(("user_id" = [])),
    params(
        ("task_id" = String, Path, description = "Task ID"),
        ListCommentsParams,
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = Envelope<CommentListData>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not a member of the task", body = ApiErrorBody),
        (status = 404, description = "Task not found", body = ApiErrorBody),
    ),
)]
pub async fn list_comments(
    AuthUser { user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(params): Query<ListCommentsParams>,
) -> Result<Json<Envelope<CommentListData>>, ApiError> {
    let task = load_task(state.store.as_ref(), &task_id).await?;
    if !task.is_member(&user_id) {
        return Err(ApiError::forbidden("Not authorized to view comments for this task"));
    }

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_COMMENT_PAGE).clamp(1, MAX_PAGE_SIZE);
    let (comments, total) = state.store.list_comments(&task.id, page, limit).await?;

    Ok(Envelope::ok(CommentListData {
        comments,
        pagination: CommentPagination {
            current_page: page,
            total_pages: total.div_ceil(limit),
            total_comments: total,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /api/tasks/{task_id}/comments
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/tasks/{task_id}/comments",
    tag = "Comments",
    security(("user_id" = [])),
    params(("task_id" = String, Path, description = "Task ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Envelope<TaskComment>),
        (status = 400, description = "Empty or oversized comment", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not a member of the task", body = ApiErrorBody),
        (status = 404, description = "Task not found", body = ApiErrorBody),
    ),
)]
pub async fn add_comment(
    AuthUser { user_id, name }: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Envelope<TaskComment>>), ApiError> {
    let text = body.text()?;
    let task = load_task(state.store.as_ref(), &task_id).await?;
    if !task.is_member(&user_id) {
        return Err(ApiError::forbidden("Not authorized to comment on this task"));
    }

    let comment = state
        .store
        .insert_comment(TaskComment::new(&task.id, &user_id, &text, Utc::now()))
        .await?;

    tracing::info!(task_id = %task.id, comment_id = %comment.id, user_id = %user_id, "comment added");

    state.gateway.notify_users(
        &Audience::task_members(&task).excluding(&user_id),
        ServerEvent::CommentAdded,
        &CommentAddedPayload {
            comment: comment.clone(),
            task: TaskRef::from(&task),
            commenter: name.clone(),
            message: format!("{name} commented on task: {}", task.title),
        },
    );

    Ok((
        StatusCode::CREATED,
        Envelope::with_message(comment, "Comment added successfully"),
    ))
}

// ---------------------------------------------------------------------------
// PUT /api/tasks/comments/{comment_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    path = "/api/tasks/comments/{comment_id}",
    tag = "Comments",
    security(("user_id" = [])),
    params(("comment_id" = String, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = Envelope<TaskComment>),
        (status = 400, description = "Empty or oversized comment", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Not the author", body = ApiErrorBody),
        (status = 404, description = "Comment not found", body = ApiErrorBody),
    ),
)]
pub async fn update_comment(
    AuthUser { user_id, name }: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<Envelope<TaskComment>>, ApiError> {
    let text = body.text()?;
    let mut comment = load_comment(&state, &comment_id).await?;
    if comment.user_id != user_id {
        return Err(ApiError::forbidden("Not authorized to update this comment"));
    }
    let task = load_task(state.store.as_ref(), &comment.task_id).await?;

    comment.edit(&text, Utc::now());
    let comment = state.store.save_comment(comment).await?;

    tracing::info!(task_id = %task.id, comment_id = %comment.id, user_id = %user_id, "comment updated");

    state.gateway.notify_users(
        &Audience::task_members(&task).excluding(&user_id),
        ServerEvent::CommentUpdated,
        &CommentUpdatedPayload {
            comment: comment.clone(),
            task: TaskRef::from(&task),
            updater: name,
        },
    );

    Ok(Envelope::with_message(comment, "Comment updated successfully"))
}

// ---------------------------------------------------------------------------
// DELETE /api/tasks/comments/{comment_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/tasks/comments/{comment_id}",
    tag = "Comments",
    security(("user_id" = [])),
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Neither author nor task creator", body = ApiErrorBody),
        (status = 404, description = "Comment not found", body = ApiErrorBody),
    ),
)]
pub async fn delete_comment(
    AuthUser { user_id, name }: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let comment = load_comment(&state, &comment_id).await?;
    let task = load_task(state.store.as_ref(), &comment.task_id).await?;
    if comment.user_id != user_id && !task.is_creator(&user_id) {
        return Err(ApiError::forbidden("Not authorized to delete this comment"));
    }

    if !state.store.delete_comment(&comment.id).await? {
        return Err(ApiError::not_found("Comment not found"));
    }

    tracing::info!(task_id = %task.id, comment_id = %comment.id, user_id = %user_id, "comment deleted");

    state.gateway.notify_users(
        &Audience::task_members(&task).excluding(&user_id),
        ServerEvent::CommentDeleted,
        &CommentDeletedPayload {
            comment_id: comment.id,
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            deleter: name,
        },
    );

    Ok(MessageResponse::ok("Comment deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: Option<&str>) -> CommentRequest {
        CommentRequest {
            comment: text.map(str::to_string),
        }
    }

    #[test]
    fn comment_text_is_trimmed() {
        assert_eq!(request(Some("  hi there ")).text().unwrap(), "hi there");
    }

    #[test]
    fn blank_comment_is_required() {
        for body in [request(None), request(Some("   "))] {
            let err = body.text().unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.message, "Comment is required");
        }
    }

    #[test]
    fn oversized_comment_is_rejected() {
        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        let err = request(Some(&long)).text().unwrap_err();
        assert_eq!(err.details.unwrap()[0].field, "comment");
        assert!(request(Some(&"x".repeat(MAX_COMMENT_LEN))).text().is_ok());
    }
}
