//! acct API - account HTTP service
//!
//! Signup, login, refresh-token exchange and profile management over a
//! pluggable user store.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::middleware::{security_headers_middleware, SecurityHeaders};
use crate::state::AppState;

/// OpenAPI document for the service
#[derive(OpenApi)]
#[openapi(
    info(title = "acct API", description = "Account signup, login and profile service"),
    paths(
        handlers::health::health_check,
        handlers::auth::signup_handler,
        handlers::auth::login_handler,
        handlers::auth::refresh_handler,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
    ),
    components(schemas(
        error::ApiError,
        handlers::health::HealthResponse,
        handlers::auth::AuthResponse,
        handlers::auth::RefreshResponse,
        handlers::profile::ProfileResponse,
        handlers::profile::UpdateProfileRequest,
        handlers::profile::ProfileSummary,
        handlers::profile::ProfileUpdateResponse,
        auth::SignupRequest,
        auth::LoginRequest,
        auth::UserSummary,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Signup, login and token refresh"),
        (name = "profile", description = "Authenticated user profile"),
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
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let security = SecurityHeaders {
        hsts: state.config.runtime.is_production(),
    };

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(
            security,
            security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
