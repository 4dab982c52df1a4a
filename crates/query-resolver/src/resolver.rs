//! Delegate-first question answering

use std::sync::Arc;

use captioning::{DelegateError, SceneCaptioner};
use frame_ingest::Frame;
use perception::Detection;
use tracing::{debug, warn};

use crate::rules::fallback_answer;

/// Answers questions with the generative delegate, falling back to the
/// deterministic rule table when the delegate cannot respond.
pub struct QueryResolver {
    delegate: Arc<dyn SceneCaptioner>,
}

impl QueryResolver {
    pub fn new(delegate: Arc<dyn SceneCaptioner>) -> Self {
        Self { delegate }
    }

    /// Blocking call; dispatch through the inference pool alongside other
    /// model invocations.
    pub fn answer(&self, frame: &Frame, question: &str, detections: &[Detection]) -> String {
        match self.delegate.answer(frame, question) {
            Ok(text) => text,
            Err(DelegateError::Unavailable) => {
                debug!("generative delegate unavailable, using rule table");
                fallback_answer(question, detections)
            }
            Err(DelegateError::Failed(reason)) => {
                warn!(%reason, "generative answer failed, using rule table");
                fallback_answer(question, detections)
            }
        }
    }
}
