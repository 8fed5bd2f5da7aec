//! User model - account records and their request/response shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User entity. The flags are independent booleans, not a hierarchy.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
    pub is_organizer: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified, active account.
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash,
            is_active: true,
            is_verified: false,
            is_superuser: false,
            is_organizer: false,
            created_at: Utc::now(),
        }
    }

    /// Convert to sanitized response (no password hash).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// Request to register a new account.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "alice")]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "correct-horse-battery", min_length = 8)]
    pub password: String,
}

/// Request to login with email/password.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

/// User response for the API (without sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
    pub is_organizer: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            is_active: u.is_active,
            is_verified: u.is_verified,
            is_superuser: u.is_superuser,
            is_organizer: u.is_organizer,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_active_and_unverified() {
        let user = User::new(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "$argon2id$hash".to_string(),
        );
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert!(!user.is_superuser);
        assert!(!user.is_organizer);
    }

    #[test]
    fn sanitized_response_matches_entity() {
        let user = User::new(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "$argon2id$hash".to_string(),
        );
        let res = user.sanitized();
        assert_eq!(res.id, user.id);
        assert_eq!(res.email, user.email);
        assert_eq!(res.is_verified, user.is_verified);
    }
}
