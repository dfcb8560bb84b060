//! Route definitions for the Sniffer API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Scoring
        .route("/analyze", post(handlers::analyze_scan))
        .route("/environment", post(handlers::get_environment))
        // Learning
        .route("/feedback", post(handlers::submit_feedback))
        .route("/zones/:zone_hash/weights", get(handlers::get_zone_weights))
        // Dashboard
        .route("/dashboard", get(handlers::get_dashboard))
}
