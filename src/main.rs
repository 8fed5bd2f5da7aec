use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;

use stagepass::{
    build_router,
    config::AuthConfig,
    db,
    services::{AuthService, Database, SmtpMailer, SystemClock, TokenCodec},
    telemetry::init_tracing,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), stagepass::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.service_name, &config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting authentication service"
    );

    let pool = db::create_pool(&config.database)
        .await
        .map_err(stagepass::error::AppError::Database)?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| stagepass::error::AppError::Database(e.into()))?;
    tracing::info!("Database initialized successfully");

    let database = Arc::new(Database::new(pool));

    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let tokens = TokenCodec::new(&config.tokens)?;
    let clock = Arc::new(SystemClock);

    let auth = AuthService::new(
        database.clone(),
        database.clone(),
        tokens.clone(),
        mailer,
        clock.clone(),
    );

    let state = AppState {
        config: config.clone(),
        users: database.clone(),
        sessions: database,
        tokens,
        clock,
        auth,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
