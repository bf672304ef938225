//! API error handling: maps the pipeline's error taxonomy onto the
//! uniform envelope and HTTP status codes of §6.1/§7.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The uniform error envelope every non-2xx response carries.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status_code: u16,
}

/// API-specific error wrapper pairing an HTTP status with the envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self { status, body: ErrorResponse { error: message, status_code: status.as_u16() } }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        let status = match &error {
            PipelineError::BadInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Io(_) | PipelineError::ImageProcessing(_) | PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_maps_to_unprocessable_entity() {
        let api_error: ApiError = PipelineError::BadInput("too short".into()).into();
        assert_eq!(api_error.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn not_found_maps_to_404() {
        let api_error: ApiError = PipelineError::NotFound("job".into()).into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn unavailable_maps_to_503() {
        let api_error: ApiError = PipelineError::engine_unavailable().into();
        assert_eq!(api_error.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
