//! Route Handlers
//!
//! One module per resource. All frame-accepting endpoints take
//! `multipart/form-data` with the image under a `frame` file field and
//! any scalar parameters as plain text fields.

pub mod analyze;
pub mod calibrate;
pub mod health;
pub mod ocr;
pub mod question;

use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;

use crate::error::ApiError;

/// Field name carrying the image bytes
const FRAME_FIELD: &str = "frame";

/// Collected multipart form: the frame upload plus scalar text fields
pub(crate) struct SubmittedForm {
    frame: Option<Bytes>,
    fields: HashMap<String, String>,
}

impl SubmittedForm {
    /// Drain the multipart stream into memory
    pub(crate) async fn collect(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut frame = None;
        let mut fields = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::invalid_input("Malformed multipart request"))?
        {
            // Take the name before consuming the field body
            let name = field.name().map(ToString::to_string);
            match name.as_deref() {
                Some(FRAME_FIELD) => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::invalid_input("Malformed multipart request"))?;
                    frame = Some(data);
                }
                Some(key) => {
                    let key = key.to_string();
                    let value = field
                        .text()
                        .await
                        .map_err(|_| ApiError::invalid_input("Malformed multipart request"))?;
                    fields.insert(key, value);
                }
                None => continue,
            }
        }

        Ok(Self { frame, fields })
    }

    /// Frame bytes, or a 400 with the endpoint's missing-frame message
    pub(crate) fn frame(&self, missing: &str) -> Result<&[u8], ApiError> {
        self.frame
            .as_deref()
            .ok_or_else(|| ApiError::invalid_input(missing))
    }

    /// Scalar text field, if present
    pub(crate) fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}
