//! Calibration Store
//!
//! Owns the single distance-scaling constant K (distance ≈ K / bbox height)
//! used for monocular distance estimation. K is persisted as a small JSON
//! file and survives restarts; load is tolerant of a missing or corrupt
//! store and never fails the caller.

mod store;

pub use store::{best_height, CalibrationConfig, CalibrationOutcome, CalibrationStore};

use thiserror::Error;

/// Calibration errors
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("No object detected for calibration")]
    NoObjectDetected,

    #[error("Known distance must be positive, got {0}")]
    InvalidDistance(f64),

    #[error("Calibration store error: {0}")]
    Store(String),
}
