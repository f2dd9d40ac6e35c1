//! API Routes
//!
//! Configures the Axum router with all caching proxy endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, invalidate_handler, read_handler, reset_stats_handler,
    stats_handler, write_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /resource/:key` - Read through the cache
/// - `PUT /resource/:key` - Write to the origin, invalidating the cached copy
/// - `DELETE /cache/:key` - Invalidate one key
/// - `DELETE /cache` - Invalidate everything
/// - `GET /stats`, `DELETE /stats` - Read or reset access statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/resource/:key", get(read_handler).put(write_handler))
        .route("/cache/:key", delete(invalidate_handler))
        .route("/cache", delete(clear_handler))
        .route("/stats", get(stats_handler).delete(reset_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
