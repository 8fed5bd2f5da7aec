//! Refresh session model - one row per live device login.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Refresh session entity.
///
/// The refresh token is an opaque UUID used purely as a lookup key; no
/// claims are embedded. Validity is `now < created_at + expires_in`.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: i64,
    pub refresh_token: Uuid,
    pub user_id: Uuid,
    pub expires_in: i64,
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(self.expires_in)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}
