//! Frame Analysis Routes

use axum::extract::{Multipart, State};
use axum::Json;
use pipeline::AnalyzeResponse;
use std::sync::Arc;

use crate::error::ApiError;
use crate::routes::SubmittedForm;
use crate::AppState;

/// Run the full per-frame pipeline on an uploaded image
pub async fn analyze_frame(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let form = SubmittedForm::collect(multipart).await?;
    let frame = form.frame("No frame provided")?;

    let response = state.pipeline.analyze_frame(frame).await?;
    Ok(Json(response))
}
