//! Discovery Helper Endpoint
//!
//! GET /scan enumerates candidates, probes them and returns `[{ip, id}]` for
//! every device that answered with an in-range address.

use super::AppState;
use axum::{extract::State, http::StatusCode, Json};
use tessera_core::Device;

#[tracing::instrument(skip(state))]
pub async fn get_scan(
    State(state): State<AppState>,
) -> Result<Json<Vec<Device>>, (StatusCode, String)> {
    let registry = {
        let mut controller = state.controller.lock().await;
        controller.scan().await
    }
    .map_err(|e| {
        tracing::warn!(error = %e, "Scan failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Scan failed: {e:#}"))
    })?;

    Ok(Json(registry.devices()))
}
