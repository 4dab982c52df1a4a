//! Text Recognition Routes

use axum::extract::{Multipart, State};
use axum::Json;
use pipeline::OcrResponse;
use std::sync::Arc;
use text_recognition::LanguageSet;

use crate::error::ApiError;
use crate::routes::SubmittedForm;
use crate::AppState;

/// Read text from an uploaded frame
///
/// An optional `lang` field selects recognition languages as a
/// comma-separated list of codes; it defaults to English.
pub async fn read_text(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, ApiError> {
    let form = SubmittedForm::collect(multipart).await?;
    let frame = form.frame("No frame provided")?;
    let languages = match form.text("lang") {
        Some(csv) => LanguageSet::from_csv(csv),
        None => LanguageSet::english(),
    };

    let response = state.pipeline.read_text(frame, languages).await?;
    Ok(Json(response))
}
