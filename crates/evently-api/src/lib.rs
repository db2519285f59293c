//! Evently API - HTTP server and credential pipeline
//!
//! Registration, login and password reset endpoints, plus the two gates that
//! protect every other route: bearer-token authentication followed by
//! role-based authorization.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use evently_core::LoggingConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::reset_password_handler,
        handlers::auth::profile_handler,
        handlers::auth::admin_test_handler,
        handlers::auth::organizer_test_handler,
        handlers::auth::customer_test_handler,
    ),
    components(schemas(
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::ResetPasswordRequest,
        auth::UserInfo,
        handlers::auth::MessageResponse,
        handlers::auth::ProfileResponse,
        handlers::auth::RoleTestResponse,
        handlers::health::HealthResponse,
        error::ApiError,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Accounts and session tokens"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the application router
///
/// Registers the role requirements of the protected routes on `state.roles`.
pub fn create_router(state: Arc<AppState>) -> Router {
    routes::register_role_requirements(&state.roles);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(routes::api_routes(state.clone()))
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Calling this twice is a no-op.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},audit=info", config.level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
