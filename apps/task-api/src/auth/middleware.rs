//! Caller identity forwarded by the upstream auth layer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Authenticated user taken from `X-User-Id` / `X-User-Name`.
///
/// The name is used in notification text and falls back to the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub name: String,
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_value(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no user"))?
            .to_string();
        let name = header_value(&parts.headers, USER_NAME_HEADER)
            .map(str::to_string)
            .unwrap_or_else(|| user_id.clone());

        Ok(AuthUser { user_id, name })
    }
}
