//! Access guard: resolves the caller's identity from a bearer access token
//! and exposes role-gate extractors for protected handlers.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{error::AppError, models::User, AppState};

/// Resolve the access token from the `Authorization` header or the
/// `access_token` cookie, decode it, and stash the owning user in request
/// extensions. Expired access tokens are rejected here by the codec; no
/// separate expiry check exists downstream.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let cookie_token = jar
        .get(crate::handlers::auth::ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string());

    let raw = header_token
        .or(cookie_token)
        .ok_or(AppError::InvalidToken)?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(&raw);

    let claims = state.tokens.decode(token, state.clock.now())?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::InvalidToken)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Forbid callers who have not confirmed their email address.
pub fn require_verified(user: &User) -> Result<(), AppError> {
    if !user.is_verified {
        return Err(AppError::Forbidden("verify email".to_string()));
    }
    Ok(())
}

pub fn require_active(user: &User) -> Result<(), AppError> {
    if !user.is_active {
        return Err(AppError::Forbidden("user is not active".to_string()));
    }
    Ok(())
}

pub fn require_superuser(user: &User) -> Result<(), AppError> {
    if !user.is_superuser {
        return Err(AppError::Forbidden("not enough privileges".to_string()));
    }
    Ok(())
}

pub fn require_organizer(user: &User) -> Result<(), AppError> {
    if !user.is_organizer {
        return Err(AppError::Forbidden(
            "organizer privileges required".to_string(),
        ));
    }
    Ok(())
}

fn resolved_user(parts: &Parts) -> Result<User, AppError> {
    parts
        .extensions
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("auth middleware not installed")))
}

/// The token's owner, with no role gates applied. Lets a freshly registered
/// user inspect their own profile before verifying their email.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolved_user(parts)?))
    }
}

/// Verified and active caller. The default gate for protected operations.
pub struct ActiveUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActiveUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolved_user(parts)?;
        require_verified(&user)?;
        require_active(&user)?;
        Ok(ActiveUser(user))
    }
}

/// Verified caller holding the superuser flag.
pub struct SuperUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SuperUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolved_user(parts)?;
        require_verified(&user)?;
        require_superuser(&user)?;
        Ok(SuperUser(user))
    }
}

/// Verified caller holding the organizer flag. Gate for event-management
/// handlers, which live outside this service.
pub struct OrganizerUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OrganizerUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolved_user(parts)?;
        require_verified(&user)?;
        require_organizer(&user)?;
        Ok(OrganizerUser(user))
    }
}
