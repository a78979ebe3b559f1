//! JSON handlers for devices known to the hub.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use relayhub_domain::device_state::DeviceSummary;
use relayhub_domain::error::{NotFoundError, RelayError};
use relayhub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<DeviceSummary>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<DeviceSummary>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
///
/// Every device that is connected or has a cached state, sorted by id.
pub async fn list(State(state): State<AppState>) -> ListResponse {
    ListResponse::Ok(Json(state.hub.devices()))
}

/// `GET /api/devices/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError> {
    let device_id = DeviceId::new(id).map_err(RelayError::from)?;
    let summary = state.hub.device(&device_id).ok_or_else(|| {
        RelayError::from(NotFoundError {
            entity: "Device",
            id: device_id.to_string(),
        })
    })?;
    Ok(GetResponse::Ok(Json(summary)))
}
