//! Shared test harness: in-memory stores, a manual clock and a null mailer
//! wired into the same state the binary builds from Postgres and SMTP.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use stagepass::{
    config::{
        AuthConfig, DatabaseConfig, Environment, ServerConfig, SmtpConfig, TokenConfig,
    },
    models::User,
    services::{AuthService, ManualClock, MemoryStore, NullMailer, TokenCodec, UserStore},
    utils::{hash_password, Password},
    AppState,
};

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        environment: Environment::Dev,
        service_name: "stagepass-test".to_string(),
        log_level: "debug".to_string(),
        server: ServerConfig {
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        tokens: TokenConfig {
            secret: "test-secret".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 30,
            verify_token_expire_hours: 24,
            refresh_token_expire_days: 7,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_address: "noreply@stagepass.local".to_string(),
        },
        swagger_enabled: false,
    }
}

pub fn harness() -> TestHarness {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let tokens = TokenCodec::new(&config.tokens).expect("test codec");

    let auth = AuthService::new(
        store.clone(),
        store.clone(),
        tokens.clone(),
        Arc::new(NullMailer),
        clock.clone(),
    );

    let state = AppState {
        config,
        users: store.clone(),
        sessions: store.clone(),
        tokens,
        clock: clock.clone(),
        auth,
    };

    TestHarness {
        state,
        store,
        clock,
    }
}

/// Insert a user with a real argon2 hash of `password`.
pub async fn seed_user(harness: &TestHarness, email: &str, password: &str, verified: bool) -> User {
    let username = email.split('@').next().unwrap_or("user").to_string();
    let hash = hash_password(&Password::new(password.to_string())).expect("hash");

    let mut user = User::new(email.to_string(), username, hash.into_string());
    user.is_verified = verified;
    harness.store.insert(&user).await.expect("insert user");
    user
}
