//! Scene captioning
//!
//! Generative scene description with deterministic fallbacks:
//! - `SceneCaptioner` trait over the generative model (caption + free-text
//!   answers)
//! - Process-wide throttle keeping expensive caption generation to a fixed
//!   minimum interval
//! - Deterministic navigation sentence composed from enriched detections

pub mod delegate;
pub mod navigate;
pub mod throttle;

pub use delegate::{MockCaptioner, SceneCaptioner};
pub use navigate::{compose_caption, navigation_sentence, NO_OBSTACLES_SENTENCE};
pub use throttle::{CaptionThrottle, DEFAULT_CAPTION_INTERVAL};

use thiserror::Error;

/// Generative delegate failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelegateError {
    #[error("Captioning model unavailable")]
    Unavailable,
    #[error("Caption generation failed: {0}")]
    Failed(String),
}
