//! PostgreSQL implementations of the user and session stores.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{RefreshSession, User};
use crate::services::{SessionStore, UserStore};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, is_active, is_verified, is_superuser, is_organizer, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_superuser)
        .bind(user.is_organizer)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_verified(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET is_verified = TRUE WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET is_active = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        // refresh_sessions rows go with the user via ON DELETE CASCADE.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at OFFSET $1 LIMIT $2")
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn create(
        &self,
        user_id: Uuid,
        refresh_token: Uuid,
        ttl_seconds: i64,
    ) -> Result<RefreshSession, AppError> {
        sqlx::query_as::<_, RefreshSession>(
            r#"
            INSERT INTO refresh_sessions (refresh_token, user_id, expires_in)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(refresh_token)
        .bind(user_id)
        .bind(ttl_seconds)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_by_token(&self, token: Uuid) -> Result<Option<RefreshSession>, AppError> {
        sqlx::query_as::<_, RefreshSession>(
            "SELECT * FROM refresh_sessions WHERE refresh_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<RefreshSession>, AppError> {
        sqlx::query_as::<_, RefreshSession>("SELECT * FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn rotate(
        &self,
        old_token: Uuid,
        new_token: Uuid,
        ttl_seconds: i64,
    ) -> Result<Option<RefreshSession>, AppError> {
        // Single conditional update: concurrent refreshes with the same
        // stale token serialize on the row, and the loser matches zero rows.
        sqlx::query_as::<_, RefreshSession>(
            r#"
            UPDATE refresh_sessions
            SET refresh_token = $2, expires_in = $3, created_at = NOW()
            WHERE refresh_token = $1
            RETURNING *
            "#,
        )
        .bind(old_token)
        .bind(new_token)
        .bind(ttl_seconds)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn delete_by_token(&self, token: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_sessions WHERE refresh_token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all_by_user(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn test_session_round_trip() {
        let pool = PgPool::connect("postgres://localhost/stagepass_test")
            .await
            .unwrap();
        let db = Database::new(pool);

        let user = User::new(
            "db-test@example.com".to_string(),
            "db-test".to_string(),
            "hash".to_string(),
        );
        UserStore::insert(&db, &user).await.unwrap();

        let token = Uuid::new_v4();
        let session = db.create(user.id, token, 3600).await.unwrap();
        assert_eq!(session.user_id, user.id);

        let found = db.find_by_token(token).await.unwrap();
        assert!(found.is_some());

        UserStore::delete(&db, user.id).await.unwrap();
        assert!(db.find_by_token(token).await.unwrap().is_none());
    }
}
