//! HTTP adapter for the provider contract
//!
//! Maps verbs and query parameters to store operations and serializes
//! results to JSON. The store itself knows nothing about HTTP; re-wiring a
//! different transport means replacing this module only.

pub mod codec;
pub mod handlers;
mod telemetry;

use crate::store::SeriesStore;
use axum::Router;
use std::sync::Arc;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Maximum request body size
    pub max_body_size: usize,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            max_body_size: 4 * 1024 * 1024, // 4MB
            enable_cors: true,
        }
    }
}

/// Shared API state
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SeriesStore>,
}

/// Build the HTTP API router
pub fn build_http_router(config: &ApiServerConfig, store: Arc<SeriesStore>) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{delete, get, post};
    use tower_http::cors::{Any, CorsLayer};

    let mut router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))

        // Session negotiation
        .route("/api/v1/capabilities", get(handlers::get_capabilities))

        // Series loads
        .route("/api/v1/series", get(handlers::load_series))
        .route("/api/v1/meta", get(handlers::load_meta))

        // Revision views
        .route("/api/v1/series/vintage", get(handlers::load_vintage))
        .route("/api/v1/series/vintages", get(handlers::load_vintage_timestamps))
        .route("/api/v1/series/release", get(handlers::load_release))
        .route("/api/v1/series/history", get(handlers::load_complete_history))

        // Editing
        .route("/api/v1/series", post(handlers::create_series))
        .route("/api/v1/series/:name", delete(handlers::remove_series))

        // Browse and search
        .route("/api/v1/browse", get(handlers::load_tree))
        .route("/api/v1/browse/list", get(handlers::list_series))
        .route("/api/v1/search", get(handlers::search_series))

        .with_state(ApiState { store })
        .layer(middleware::from_fn(telemetry::http_log_middleware))
        .layer(DefaultBodyLimit::max(config.max_body_size));

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn ready_check() -> &'static str {
    "READY"
}
