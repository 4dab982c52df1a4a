//! Generative captioner delegate

use std::sync::atomic::{AtomicUsize, Ordering};

use frame_ingest::Frame;

use crate::DelegateError;

/// Generative scene model. Implementations describe a frame and answer
/// free-text questions about it; both calls block for the duration of
/// inference.
pub trait SceneCaptioner: Send + Sync {
    /// Describe the frame, optionally steered by a prompt
    fn caption(&self, frame: &Frame, prompt: Option<&str>) -> Result<String, DelegateError>;

    /// Answer a free-text question about the frame
    fn answer(&self, frame: &Frame, question: &str) -> Result<String, DelegateError>;
}

/// Scripted captioner for tests and wiring without model weights
pub struct MockCaptioner {
    caption_text: Option<String>,
    answer_text: Option<String>,
    calls: AtomicUsize,
}

impl MockCaptioner {
    pub fn new(caption_text: &str, answer_text: &str) -> Self {
        Self {
            caption_text: Some(caption_text.to_string()),
            answer_text: Some(answer_text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A captioner whose model never loaded
    pub fn unavailable() -> Self {
        Self {
            caption_text: None,
            answer_text: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of caption/answer invocations so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SceneCaptioner for MockCaptioner {
    fn caption(&self, _frame: &Frame, _prompt: Option<&str>) -> Result<String, DelegateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.caption_text.clone().ok_or(DelegateError::Unavailable)
    }

    fn answer(&self, _frame: &Frame, _question: &str) -> Result<String, DelegateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer_text.clone().ok_or(DelegateError::Unavailable)
    }
}
