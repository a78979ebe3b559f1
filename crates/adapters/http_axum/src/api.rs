//! Read-only JSON API over the hub's registry and state cache.

#[allow(clippy::missing_errors_doc)]
pub mod devices;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::not_found;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/devices", get(devices::list))
        .route("/devices/{id}", get(devices::get))
        .route("/stats", get(stats))
        .fallback(not_found)
}

/// Connection counts reported by `GET /api/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub devices: usize,
    pub clients: usize,
    pub cached_states: usize,
}

/// `GET /api/stats`
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.hub.stats();
    Json(StatsResponse {
        devices: stats.devices,
        clients: stats.clients,
        cached_states: stats.cached_states,
    })
}
