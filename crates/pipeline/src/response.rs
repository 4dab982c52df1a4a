//! Wire response shapes
//!
//! Field names and casing match the established client protocol, so
//! serde renames where Rust naming differs.

use calibration::CalibrationOutcome;
use obstacle_scan::{WallAlert, WallObservation};
use perception::Detection;
use serde::Serialize;
use text_recognition::LanguageSet;

/// Full per-frame analysis
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub detections: Vec<Detection>,
    pub caption: String,
    pub navigation_caption: String,
    pub has_objects: bool,
    #[serde(rename = "K_value")]
    pub k_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wall_alert: Option<WallAlert>,
    pub wall_info: WallObservation,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct CalibrationResponse {
    pub success: bool,
    #[serde(rename = "K")]
    pub k: f64,
    pub bbox_height: i32,
    pub distance_m: f64,
}

impl From<CalibrationOutcome> for CalibrationResponse {
    fn from(outcome: CalibrationOutcome) -> Self {
        Self {
            success: true,
            k: outcome.k,
            bbox_height: outcome.bbox_height,
            distance_m: outcome.distance_m,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalibrationState {
    #[serde(rename = "K")]
    pub k: Option<f64>,
    pub is_calibrated: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    #[serde(rename = "K")]
    pub k: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    pub success: bool,
    pub text: String,
    pub confidence: f64,
    pub line_count: usize,
    pub lines: Vec<String>,
    pub languages: LanguageSet,
}
