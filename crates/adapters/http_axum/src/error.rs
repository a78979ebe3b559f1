//! HTTP error response mapping.

use axum::Json;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use relayhub_domain::error::{NotFoundError, RelayError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`RelayError`] to an HTTP response with appropriate status code.
pub struct ApiError(RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RelayError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            RelayError::Protocol(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            RelayError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Fallback for reserved prefixes: a JSON 404 instead of the UI bundle.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::from(RelayError::from(NotFoundError {
        entity: "Route",
        id: uri.path().to_string(),
    }))
}
