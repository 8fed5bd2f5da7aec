use axum::{extract::State, Json};

use crate::{
    error::{AppError, ErrorResponse},
    AppState,
};

/// Service health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Database unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "database": "up"
        }
    })))
}
