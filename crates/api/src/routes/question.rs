//! Question Routes

use axum::extract::{Multipart, State};
use axum::Json;
use pipeline::QuestionResponse;
use std::sync::Arc;

use crate::error::ApiError;
use crate::routes::SubmittedForm;
use crate::AppState;

const MISSING: &str = "Missing frame or question";

/// Answer a question about an uploaded frame
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<QuestionResponse>, ApiError> {
    let form = SubmittedForm::collect(multipart).await?;
    let frame = form.frame(MISSING)?;
    let question = form
        .text("question")
        .ok_or_else(|| ApiError::invalid_input(MISSING))?;

    let response = state.pipeline.answer_question(frame, question).await?;
    Ok(Json(response))
}
