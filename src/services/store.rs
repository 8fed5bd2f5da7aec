//! Storage traits for the user directory and the refresh-session store,
//! plus an in-memory implementation used as a test double.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{RefreshSession, User};
use crate::services::Clock;

/// User directory operations consumed by the auth core.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    /// Mark the user verified; returns the updated row, `None` if absent.
    async fn set_verified(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Flip the active flag (soft delete); returns the updated row.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, AppError>;
    /// Hard delete. Sessions go with the user (cascade at the storage layer).
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Refresh-session persistence keyed by the opaque refresh token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        refresh_token: Uuid,
        ttl_seconds: i64,
    ) -> Result<RefreshSession, AppError>;

    async fn find_by_token(&self, token: Uuid) -> Result<Option<RefreshSession>, AppError>;

    async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<RefreshSession>, AppError>;

    /// Atomically swap the token on the row currently holding `old_token`,
    /// resetting expiry and creation time. Returns `None` when no row holds
    /// `old_token` anymore - the caller lost a rotation race or the token
    /// was never issued.
    async fn rotate(
        &self,
        old_token: Uuid,
        new_token: Uuid,
        ttl_seconds: i64,
    ) -> Result<Option<RefreshSession>, AppError>;

    /// Idempotent: deleting an unknown token is a no-op.
    async fn delete_by_token(&self, token: Uuid) -> Result<(), AppError>;

    async fn delete_all_by_user(&self, user_id: Uuid) -> Result<(), AppError>;
}

/// In-memory store backing the integration tests. Mirrors the semantics of
/// the Postgres implementation, including creation timestamps taken from
/// the injected clock.
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    sessions: Mutex<HashMap<Uuid, RefreshSession>>,
    next_session_id: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            next_session_id: AtomicI64::new(1),
            clock,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn set_verified(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&id).map(|u| {
            u.is_verified = true;
            u.clone()
        }))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.get_mut(&id).map(|u| {
            u.is_active = active;
            u.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.users.lock().unwrap().remove(&id);
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| s.user_id != id);
        Ok(())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<User>, AppError> {
        let users = self.users.lock().unwrap();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        refresh_token: Uuid,
        ttl_seconds: i64,
    ) -> Result<RefreshSession, AppError> {
        let session = RefreshSession {
            id: self.next_session_id.fetch_add(1, Ordering::SeqCst),
            refresh_token,
            user_id,
            expires_in: ttl_seconds,
            created_at: self.clock.now(),
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(refresh_token, session.clone());
        Ok(session)
    }

    async fn find_by_token(&self, token: Uuid) -> Result<Option<RefreshSession>, AppError> {
        Ok(self.sessions.lock().unwrap().get(&token).cloned())
    }

    async fn find_all_by_user(&self, user_id: Uuid) -> Result<Vec<RefreshSession>, AppError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn rotate(
        &self,
        old_token: Uuid,
        new_token: Uuid,
        ttl_seconds: i64,
    ) -> Result<Option<RefreshSession>, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        Ok(sessions.remove(&old_token).map(|mut session| {
            session.refresh_token = new_token;
            session.expires_in = ttl_seconds;
            session.created_at = self.clock.now();
            sessions.insert(new_token, session.clone());
            session
        }))
    }

    async fn delete_by_token(&self, token: Uuid) -> Result<(), AppError> {
        self.sessions.lock().unwrap().remove(&token);
        Ok(())
    }

    async fn delete_all_by_user(&self, user_id: Uuid) -> Result<(), AppError> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| s.user_id != user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SystemClock;

    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn rotate_moves_the_row_not_copies_it() {
        let store = store();
        let user_id = Uuid::new_v4();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();

        let created = store.create(user_id, old, 3600).await.unwrap();
        let rotated = store.rotate(old, new, 7200).await.unwrap().unwrap();

        assert_eq!(rotated.id, created.id);
        assert_eq!(rotated.refresh_token, new);
        assert!(store.find_by_token(old).await.unwrap().is_none());
        assert_eq!(store.find_all_by_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rotate_unknown_token_returns_none() {
        let store = store();
        let result = store
            .rotate(Uuid::new_v4(), Uuid::new_v4(), 3600)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_user_cascades_to_sessions() {
        let store = store();
        let user = User::new(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        store.insert(&user).await.unwrap();
        store.create(user.id, Uuid::new_v4(), 3600).await.unwrap();

        store.delete(user.id).await.unwrap();
        assert!(store.find_all_by_user(user.id).await.unwrap().is_empty());
    }
}
