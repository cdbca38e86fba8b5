pub mod comments;
pub mod health;
pub mod tasks;

use axum::Json;
use axum::Router;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::middleware::USER_ID_HEADER;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest("/api", tasks::router().merge(comments::router()))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Success envelope: `{"success": true, "data": ..., "message"?: ...}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: Some(message.into()),
        })
    }
}

/// Success envelope for endpoints that return no data.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Tasks
        tasks::list_tasks,
        tasks::list_tags,
        tasks::list_chat_users,
        tasks::list_user_tasks,
        tasks::get_task,
        tasks::create_task,
        tasks::update_task,
        tasks::delete_task,
        tasks::assign_task,
        // Comments
        comments::list_comments,
        comments::add_comment,
        comments::update_comment,
        comments::delete_comment,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::FieldError,
            // Models
            crate::models::task::Task,
            crate::models::task::TaskResponse,
            crate::models::task::TaskStatus,
            crate::models::task::Priority,
            crate::models::comment::TaskComment,
            crate::models::filter::TaskStats,
            crate::models::filter::Pagination,
            crate::db::contacts::Contact,
            // Route request/response types
            MessageResponse,
            health::HealthResponse,
            tasks::CreateTaskRequest,
            tasks::UpdateTaskRequest,
            tasks::AssignTaskRequest,
            tasks::TaskListData,
            tasks::UserTasksData,
            comments::CommentRequest,
            comments::CommentListData,
            comments::CommentPagination,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Tasks", description = "Task management"),
        (name = "Comments", description = "Task comments"),
    )
)]
pub struct ApiDoc;
