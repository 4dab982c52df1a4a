//! Frame analysis pipeline
//!
//! Ties the domain services together behind one entry point:
//! - Detection, enrichment and captioning per frame
//! - Wall scanning, evidence fusion and cooldown-gated alerts
//! - Calibration, question answering and text reading
//! - A bounded inference pool keeping blocking model calls off the
//!   async runtime

pub mod pool;
pub mod response;
pub mod service;

pub use pool::{InferencePool, DEFAULT_INFERENCE_TIMEOUT};
pub use response::{
    AnalyzeResponse, CalibrationResponse, CalibrationState, OcrResponse, QuestionResponse,
    ResetResponse,
};
pub use service::AnalysisPipeline;

use calibration::{CalibrationConfig, CalibrationError};
use obstacle_scan::ScanConfig;
use perception::PerceptionError;
use serde::Deserialize;
use text_recognition::RecognitionError;
use thiserror::Error;

/// Pipeline failures, mapped to responses by the request layer
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request itself was unusable
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Perception(#[from] PerceptionError),

    /// Text recognition has no reader for the requested languages
    #[error("OCR not available - model not loaded")]
    ModelUnavailable,

    /// The inference pool is saturated
    #[error("Server busy, try again")]
    Busy,

    /// An inference call exceeded the pool timeout
    #[error("Inference timed out")]
    Timeout,

    #[error("{0}")]
    Internal(String),
}

impl From<RecognitionError> for PipelineError {
    fn from(e: RecognitionError) -> Self {
        match e {
            RecognitionError::Unavailable(_) => PipelineError::ModelUnavailable,
            RecognitionError::Recognition(reason) => {
                PipelineError::Internal(format!("OCR processing failed: {}", reason))
            }
            RecognitionError::Lock(reason) => PipelineError::Internal(reason),
        }
    }
}

/// Pipeline tuning, loaded by the request layer's settings file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detections below this confidence are dropped
    pub confidence_floor: f32,
    /// Minimum spacing between generative caption calls
    pub caption_interval_secs: f64,
    /// Minimum spacing between wall alerts
    pub alert_cooldown_secs: f64,
    /// Concurrent blocking inference calls
    pub inference_concurrency: usize,
    /// In-flight inference calls admitted before rejecting
    pub inference_queue_limit: usize,
    /// Ceiling on one inference call, queue wait included
    pub inference_timeout_secs: u64,
    pub calibration: CalibrationConfig,
    pub scan: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_floor: perception::DEFAULT_CONFIDENCE_FLOOR,
            caption_interval_secs: 5.0,
            alert_cooldown_secs: 3.0,
            inference_concurrency: 1,
            inference_queue_limit: 8,
            inference_timeout_secs: 30,
            calibration: CalibrationConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}
