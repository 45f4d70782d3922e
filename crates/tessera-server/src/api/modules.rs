//! Module Command Endpoint
//!
//! POST /modules/{address}/height routes a height command through the latest
//! topology and delivers it to the resolved master.

use super::AppState;
use crate::network::router::{set_height, CommandOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tessera_core::{Address, ProbeError};

#[derive(Debug, Deserialize)]
pub struct SetHeightRequest {
    pub height: u32,
}

#[tracing::instrument(skip(state, req))]
pub async fn set_module_height(
    State(state): State<AppState>,
    Path(address): Path<Address>,
    Json(req): Json<SetHeightRequest>,
) -> Result<Json<CommandOutcome>, (StatusCode, String)> {
    let topology = state.snapshot().await;

    set_height(&state.prober, &topology, address, req.height)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(address = address, error = %e, "Height command failed");
            (status_for(&e), e.to_string())
        })
}

fn status_for(error: &ProbeError) -> StatusCode {
    match error {
        ProbeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ProbeError::Unreachable { .. } | ProbeError::MalformedResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}
