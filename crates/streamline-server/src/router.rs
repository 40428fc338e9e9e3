//! Axum router setup for the Streamline server

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::{
    handlers::{get_annotate, get_diff, get_history, health_check},
    ServerState,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/changes/:number/diff", get(get_diff))
        .route("/api/history", get(get_history))
        .route("/api/annotate", get(get_annotate))
        // The front-end may be served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
