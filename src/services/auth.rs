//! Auth service: the session-lifecycle orchestrator.
//!
//! A refresh session moves Active -> Rotated on a successful refresh (same
//! row, new token), Active -> Expired once its ttl elapses (the row is
//! deleted when discovered), and Active -> Revoked on logout or abort-all.
//! Rotation in place means a presented refresh token extends a session
//! exactly once; replaying a pre-rotation token fails as `InvalidToken`.

use std::sync::Arc;

use anyhow::anyhow;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{RegisterRequest, User};
use crate::services::{Clock, Mailer, SessionStore, TokenCodec, UserStore};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Token triple returned to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Uuid,
    pub token_type: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: TokenCodec,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: TokenCodec,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            mailer,
            clock,
        }
    }

    /// Register a new account and dispatch the verification email.
    ///
    /// The email send is fire-and-forget: a delivery failure is logged, not
    /// surfaced, and the account is created either way.
    pub async fn register(&self, req: RegisterRequest, base_url: &str) -> Result<User, AppError> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("user already exists".to_string()));
        }

        let password = Password::new(req.password);
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(anyhow!("Password hashing error: {}", e)))?;

        let user = User::new(req.email, req.username, password_hash.into_string());
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");

        let token = self.create_verify_email_token(user.id)?;
        let verification_url = format!("{}/verify?token={}", base_url, token);

        let mailer = self.mailer.clone();
        let email = user.email.clone();
        let username = user.username.clone();
        tokio::spawn(async move {
            if let Err(err) = mailer
                .send_verification_email(&email, &username, &verification_url)
                .await
            {
                tracing::warn!(error = %err, "Failed to send verification email");
            }
        });

        Ok(user)
    }

    /// Check credentials against the user directory.
    ///
    /// An unknown email and a wrong password are indistinguishable to the
    /// caller: both come back as `None`, never as an error.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };

        let password = Password::new(password.to_string());
        let hash = PasswordHashString::new(user.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(matches.then_some(user))
    }

    /// Issue an access token and open a fresh refresh session.
    ///
    /// Every login gets its own session row, so concurrent device sessions
    /// coexist; nothing is reused.
    pub async fn login(&self, user_id: Uuid) -> Result<Token, AppError> {
        let now = self.clock.now();
        let access_token = self.tokens.issue_access_token(user_id, now)?;
        let refresh_token = Uuid::new_v4();

        self.sessions
            .create(user_id, refresh_token, self.tokens.refresh_ttl_seconds())
            .await?;

        tracing::info!(user_id = %user_id, "Session opened");

        Ok(Token {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Exchange a refresh token for a new pair, rotating the session row.
    pub async fn refresh(&self, presented: Uuid) -> Result<Token, AppError> {
        let now = self.clock.now();

        let session = self
            .sessions
            .find_by_token(presented)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if session.is_expired(now) {
            self.sessions.delete_by_token(presented).await?;
            tracing::info!(user_id = %session.user_id, "Expired session removed");
            return Err(AppError::TokenExpired);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let access_token = self.tokens.issue_access_token(user.id, now)?;
        let new_token = Uuid::new_v4();

        let rotated = self
            .sessions
            .rotate(presented, new_token, self.tokens.refresh_ttl_seconds())
            .await?;

        // Zero rows rotated: a concurrent refresh already consumed this
        // token. Treat it like any other unknown token.
        if rotated.is_none() {
            return Err(AppError::InvalidToken);
        }

        tracing::info!(user_id = %user.id, "Refresh token rotated");

        Ok(Token {
            access_token,
            refresh_token: new_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Revoke the session behind `presented`, if any. Logging out an
    /// already-dead session is a no-op, not a failure.
    pub async fn logout(&self, presented: Uuid) -> Result<(), AppError> {
        self.sessions.delete_by_token(presented).await
    }

    /// Revoke every session for the user, forcing re-login on all devices.
    pub async fn abort_all_sessions(&self, user_id: Uuid) -> Result<(), AppError> {
        self.sessions.delete_all_by_user(user_id).await?;
        tracing::info!(user_id = %user_id, "All sessions aborted");
        Ok(())
    }

    /// Consume an email-verification token and mark the account verified.
    pub async fn verify_user(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.decode(token, self.clock.now())?;

        let user = self
            .users
            .set_verified(claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        tracing::info!(user_id = %user.id, "Email verified");

        Ok(user)
    }

    /// Mint a stateless email-verification token for the user.
    pub fn create_verify_email_token(&self, user_id: Uuid) -> Result<String, AppError> {
        self.tokens
            .issue_verification_token(user_id, self.clock.now())
    }
}
