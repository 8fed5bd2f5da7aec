pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod telemetry;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AuthConfig;
use crate::services::{AuthService, Clock, SessionStore, TokenCodec, UserStore};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::abort,
        handlers::auth::verify,
        handlers::users::get_me,
        handlers::users::delete_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::delete_user,
    ),
    components(
        schemas(
            models::RegisterRequest,
            models::LoginRequest,
            models::UserResponse,
            handlers::auth::RefreshRequest,
            services::Token,
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Session lifecycle and account verification"),
        (name = "Users", description = "User directory"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub tokens: TokenCodec,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthService,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/abort", post(handlers::auth::abort))
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/me",
            get(handlers::users::get_me).delete(handlers::users::delete_me),
        )
        .route(
            "/users/:user_id",
            get(handlers::users::get_user).delete(handlers::users::delete_user),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/verify", post(handlers::auth::verify))
        .merge(protected);

    if state.config.swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &AuthConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
