//! Health Routes

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub calibrated: bool,
    pub version: String,
}

/// Liveness probe with calibration status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        calibrated: state.pipeline.is_calibrated(),
        version: state.version.clone(),
    })
}
