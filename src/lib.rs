pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod services;
pub mod state;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{protected, public};

pub use state::AppState;

/// Build the full router: public auth and health routes and the bearer-gated
/// API, wrapped in CORS handling that answers every `OPTIONS` request.
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config.api.max_upload_bytes;
    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(axum::middleware::from_fn(middleware::cors_headers))
        .layer(middleware::cors_layer())
        .with_state(state);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health_get))
        .route("/api/auth/register", post(public::auth::register_post))
        .route("/api/auth/login", post(public::auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/me", get(protected::me_get))
        .route("/api/baby", get(protected::baby_get).put(protected::baby_put))
        .route("/api/events", get(protected::events_get).post(protected::events_post))
        .route("/api/events/:id", put(protected::event_put).delete(protected::event_delete))
        .route(
            "/api/documents",
            get(protected::documents_get).post(protected::document_post),
        )
        .route(
            "/api/documents/:id",
            get(protected::document_get).delete(protected::document_delete),
        )
        .route("/api/documents/:id/file", get(protected::document_file_get))
        .route_layer(axum::middleware::from_fn_with_state(state, middleware::require_bearer))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
