//! Calibration Routes

use axum::extract::{Multipart, State};
use axum::Json;
use pipeline::{CalibrationResponse, CalibrationState, ResetResponse};
use std::sync::Arc;

use crate::error::ApiError;
use crate::routes::SubmittedForm;
use crate::AppState;

const MISSING: &str = "Missing frame or distance_m";

/// Derive the distance constant from a frame at a known distance
pub async fn calibrate(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CalibrationResponse>, ApiError> {
    let form = SubmittedForm::collect(multipart).await?;
    let frame = form.frame(MISSING)?;
    let distance_m = form
        .text("distance_m")
        .ok_or_else(|| ApiError::invalid_input(MISSING))?
        .trim()
        .parse::<f64>()
        .map_err(|_| ApiError::invalid_input("Invalid distance_m"))?;

    let response = state.pipeline.calibrate(frame, distance_m).await?;
    Ok(Json(response))
}

/// Report the stored distance constant
pub async fn get_calibration(State(state): State<Arc<AppState>>) -> Json<CalibrationState> {
    Json(state.pipeline.calibration_state())
}

/// Clear the stored distance constant
pub async fn reset_calibration(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, ApiError> {
    let response = state.pipeline.reset_calibration()?;
    Ok(Json(response))
}
