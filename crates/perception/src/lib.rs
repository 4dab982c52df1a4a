//! Perception for the Vision Assistance Pipeline
//!
//! Turns raw detector output into enriched detections:
//! - Confidence filtering and bounding-box sanitation
//! - Monocular distance estimation from the calibration constant
//! - Left/center/right spatial classification
//!
//! The detection model sits behind the [`ObjectDetector`] trait; model
//! internals stay outside this crate.

pub mod classify;
pub mod detector;
pub mod enrich;

pub use classify::{distance_for_height, format_distance, Side};
pub use detector::{MockDetector, ObjectDetector, RawDetection};
pub use enrich::{enrich_detections, Detection, DEFAULT_CONFIDENCE_FLOOR};

use thiserror::Error;

/// Perception error types
#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("Detector unavailable")]
    Unavailable,

    #[error("Detection failed: {0}")]
    Detection(String),
}
