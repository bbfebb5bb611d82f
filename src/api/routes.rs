//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Build the API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        // System
        .route("/system/health", get(handlers::system_health))
        // Classified readings table
        .route("/readings", get(handlers::readings))
        // Cycle boundary configuration
        .route("/cycle", get(handlers::get_cycle))
        .route("/cycle/resets", post(handlers::add_reset))
        .route("/cycle/resets/clear", post(handlers::clear_resets))
        .route("/cycle/adjust", post(handlers::adjust_start))
        // Config
        .route("/config", get(handlers::get_config))
        .with_state(state)
}
