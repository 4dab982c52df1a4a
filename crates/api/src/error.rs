//! HTTP Error Mapping
//!
//! Converts pipeline errors into HTTP responses with a JSON body of the
//! form `{"error": "..."}`. Client mistakes map to 4xx, capacity limits
//! to 429/504, and everything else to 5xx.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use calibration::CalibrationError;
use pipeline::PipelineError;
use serde::Serialize;

/// JSON error payload
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Pipeline error carried through an axum handler
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Shorthand for rejecting malformed requests
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self(PipelineError::InvalidInput(message.into()))
    }

    fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            // A broken store is a server problem; every other calibration
            // failure is caused by the submitted frame or distance.
            PipelineError::Calibration(CalibrationError::Store(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PipelineError::Calibration(_) => StatusCode::BAD_REQUEST,
            PipelineError::Perception(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Busy => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "request failed");
        }
        let body = Json(ErrorBody {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}
