//! Formation & Routing Endpoints
//!
//! - POST /formation - run a full formation and publish the result
//! - GET /topology - latest published topology
//! - GET /route/{address} - routing decision for one module address

use super::AppState;
use crate::network::{RouteDecision, Topology};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tessera_core::Address;

#[tracing::instrument(skip(state))]
pub async fn run_formation(
    State(state): State<AppState>,
) -> Result<Json<Topology>, (StatusCode, String)> {
    let topology = state.form().await.map_err(|e| {
        tracing::warn!(error = %e, "Formation run failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Formation failed: {e:#}"),
        )
    })?;

    Ok(Json(Topology::clone(&topology)))
}

pub async fn get_topology(State(state): State<AppState>) -> Json<Topology> {
    let topology = state.snapshot().await;
    Json(Topology::clone(&topology))
}

#[tracing::instrument(skip(state))]
pub async fn get_route(
    State(state): State<AppState>,
    Path(address): Path<Address>,
) -> Json<RouteDecision> {
    Json(state.snapshot().await.decide(address))
}
