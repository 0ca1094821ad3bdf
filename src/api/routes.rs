//! API Route Configuration

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health & Registry
        .route("/health", get(handlers::health_check))
        .route("/networks", get(handlers::list_networks))
        // Credentials (write-only keys, status readable)
        .route(
            "/credentials/:chain",
            get(handlers::get_credential).put(handlers::set_credential),
        )
        // Quota
        .route("/usage", get(handlers::get_usage))
        .route("/usage/upgrade", post(handlers::upgrade))
        // Scan flow
        .route("/audit", post(handlers::run_audit))
        // Follow-up chat
        .route("/chat", post(handlers::chat))
        .route("/chat/:id", delete(handlers::close_chat));

    // Build full router
    Router::new()
        .nest("/v1", api_v1)
        // Also expose at root for convenience
        .route("/health", get(handlers::health_check))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(rate_limit_middleware))
}
