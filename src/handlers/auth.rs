//! Authentication endpoints: registration, session lifecycle, verification.
//!
//! Tokens ride in the JSON body and, for browser clients, in HttpOnly
//! cookies; the handlers accept either transport.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    config::TokenConfig,
    error::{AppError, ErrorResponse},
    middleware::ActiveUser,
    models::{LoginRequest, RegisterRequest, UserResponse},
    services::Token,
    utils::ValidatedJson,
    AppState,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[schema(example = "8f14e45f-ceea-4e47-9a6d-52f21c4a1e2b")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyRequest {
    pub token: String,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .register(req, &state.config.server.public_url)
        .await?;
    Ok((StatusCode::CREATED, Json(user.sanitized())))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = Token),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth
        .authenticate(&req.email, &req.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state.auth.login(user.id).await?;
    let jar = with_session_cookies(jar, &token, &state.config.tokens);

    Ok((jar, Json(token)))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token rotated", body = Token),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let presented = presented_refresh_token(&jar, body)?;
    let token = state.auth.refresh(presented).await?;
    let jar = with_session_cookies(jar, &token, &state.config.tokens);

    Ok((jar, Json(token)))
}

/// Logout the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Unverified or inactive account", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    _user: ActiveUser,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, AppError> {
    // Logout of an unknown or already-dead session still succeeds.
    if let Ok(presented) = presented_refresh_token(&jar, body) {
        state.auth.logout(presented).await?;
    }

    let jar = without_session_cookies(jar);
    Ok((
        jar,
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    ))
}

/// Revoke every session of the current user
#[utoipa::path(
    post,
    path = "/auth/abort",
    responses(
        (status = 200, description = "All sessions revoked"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Unverified or inactive account", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn abort(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state.auth.abort_all_sessions(user.id).await?;

    let jar = without_session_cookies(jar);
    Ok((
        jar,
        Json(serde_json::json!({ "message": "All sessions were aborted" })),
    ))
}

/// Confirm an email address with a verification token
#[utoipa::path(
    post,
    path = "/auth/verify",
    params(VerifyRequest),
    responses(
        (status = 200, description = "Email confirmed", body = UserResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify(
    State(state): State<AppState>,
    Query(req): Query<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth.verify_user(&req.token).await?;
    Ok(Json(user.sanitized()))
}

fn presented_refresh_token(
    jar: &CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<Uuid, AppError> {
    let raw = body
        .map(|Json(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()))
        .ok_or(AppError::InvalidToken)?;

    Uuid::parse_str(&raw).map_err(|_| AppError::InvalidToken)
}

fn with_session_cookies(jar: CookieJar, token: &Token, config: &TokenConfig) -> CookieJar {
    // The cookie carries the bare JWT; a space is not a valid cookie octet.
    let bare_access = token
        .access_token
        .strip_prefix("Bearer ")
        .unwrap_or(&token.access_token)
        .to_string();

    let access = Cookie::build((ACCESS_TOKEN_COOKIE, bare_access))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(
            config.access_token_expire_minutes,
        ));

    let refresh = Cookie::build((REFRESH_TOKEN_COOKIE, token.refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.refresh_token_expire_days));

    jar.add(access).add(refresh)
}

fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(cleared(ACCESS_TOKEN_COOKIE))
        .remove(cleared(REFRESH_TOKEN_COOKIE))
}

fn cleared(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path("/");
    cookie
}
