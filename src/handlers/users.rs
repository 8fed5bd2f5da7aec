//! User directory endpoints: the caller's own profile plus superuser
//! administration. Event CRUD lives in a separate service.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    error::{AppError, ErrorResponse},
    middleware::{ActiveUser, CurrentUser, SuperUser},
    models::UserResponse,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.sanitized())
}

/// Deactivate the current account and revoke its sessions
#[utoipa::path(
    delete,
    path = "/users/me",
    responses(
        (status = 200, description = "Account deactivated"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Unverified or inactive account", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_me(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state.auth.abort_all_sessions(user.id).await?;
    state
        .users
        .set_active(user.id, false)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

    let jar = jar
        .remove(cookie_cleared(super::auth::ACCESS_TOKEN_COOKIE))
        .remove(cookie_cleared(super::auth::REFRESH_TOKEN_COOKIE));

    Ok((
        jar,
        Json(serde_json::json!({ "message": "Account deactivated" })),
    ))
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    params(ListQuery),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Unverified or inactive account", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    _user: ActiveUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list(query.offset, query.limit).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Fetch a user by id
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: SuperUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(user.sanitized()))
}

/// Delete a user by id
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Superuser privileges required", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _user: SuperUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete(user_id).await?;
    tracing::info!(user_id = %user_id, "User deleted by superuser");
    Ok(Json(serde_json::json!({ "message": "User was deleted" })))
}

fn cookie_cleared(name: &'static str) -> axum_extra::extract::cookie::Cookie<'static> {
    let mut cookie = axum_extra::extract::cookie::Cookie::from(name);
    cookie.set_path("/");
    cookie
}
