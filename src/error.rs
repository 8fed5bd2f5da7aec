//! Application-wide error taxonomy.
//!
//! Every failure surfaces to the caller as a typed error; there are no
//! internal retries. Token decode failures are deliberately collapsed into
//! a single `InvalidToken` kind so callers cannot tell a bad signature from
//! malformed claims or an unknown session.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("email error: {0}")]
    Email(String),

    #[error("configuration error: {0}")]
    Config(anyhow::Error),

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid token")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, self.to_string(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Email(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "email error".to_string(),
                Some(msg),
            ),
            AppError::Config(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
                Some(err.to_string()),
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_kinds_map_to_401() {
        for err in [
            AppError::InvalidCredentials,
            AppError::InvalidToken,
            AppError::TokenExpired,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn forbidden_carries_message() {
        let res = AppError::Forbidden("verify email".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn conflict_maps_to_409() {
        let res = AppError::Conflict("user already exists".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
