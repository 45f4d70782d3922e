//! HTTP API Module
//!
//! REST API endpoints for the tessera server.
//!
//! This module contains:
//! - `state`: Shared application state
//! - `health`: Liveness, readiness and version
//! - `metrics`: Prometheus metrics endpoint
//! - `scan`: Discovery helper (`GET /scan`)
//! - `topology`: Formation runs, topology snapshot and routing decisions
//! - `modules`: Per-module height commands

mod health;
mod metrics;
mod modules;
mod scan;
mod state;
mod topology;

pub use modules::SetHeightRequest;
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/version", get(health::get_version))
        // Observability
        .route("/metrics", get(metrics::get_metrics))
        // Discovery & formation
        .route("/scan", get(scan::get_scan))
        .route("/formation", post(topology::run_formation))
        .route("/topology", get(topology::get_topology))
        // Routing & commands
        .route("/route/{address}", get(topology::get_route))
        .route("/modules/{address}/height", post(modules::set_module_height))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
