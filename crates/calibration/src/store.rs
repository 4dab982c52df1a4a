//! Calibration store implementation

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use perception::Detection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::CalibrationError;

/// Calibration store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    /// Path of the persisted constant
    pub store_path: PathBuf,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("calib_K.json"),
        }
    }
}

/// Persisted file shape: one JSON object keyed by "K"
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCalibration {
    #[serde(rename = "K", skip_serializing_if = "Option::is_none")]
    k: Option<f64>,
}

/// Result of a successful calibration
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationOutcome {
    /// The new constant
    pub k: f64,
    /// Pixel height of the contributing detection
    pub bbox_height: i32,
    /// Known distance supplied by the caller
    pub distance_m: f64,
}

/// Lock-guarded owner of the calibration constant
///
/// Reads during analysis take the read side; calibrate and reset take the
/// write side, so a distance lookup never observes a half-applied update.
pub struct CalibrationStore {
    k: RwLock<Option<f64>>,
    path: PathBuf,
}

impl CalibrationStore {
    /// Open the store, loading the persisted constant when present.
    ///
    /// A missing or corrupt file yields an uncalibrated store, never an
    /// error.
    pub fn open(config: &CalibrationConfig) -> Self {
        let k = Self::load_from(&config.store_path);
        match k {
            Some(k) => info!(k, path = %config.store_path.display(), "loaded calibration"),
            None => info!(path = %config.store_path.display(), "no calibration on disk"),
        }
        Self {
            k: RwLock::new(k),
            path: config.store_path.clone(),
        }
    }

    fn load_from(path: &PathBuf) -> Option<f64> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => return None,
        };
        let parsed: PersistedCalibration = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt calibration file");
                return None;
            }
        };
        match parsed.k {
            Some(k) if k > 0.0 => Some(k),
            Some(k) => {
                warn!(k, "ignoring non-positive persisted calibration");
                None
            }
            None => None,
        }
    }

    /// Current constant, or `None` when uncalibrated
    pub fn k(&self) -> Option<f64> {
        self.k.read().map(|guard| *guard).unwrap_or(None)
    }

    /// Whether a constant is currently set
    pub fn is_calibrated(&self) -> bool {
        self.k().is_some()
    }

    /// Derive and store a new constant from a known distance and the
    /// best detection height.
    ///
    /// Persists before updating memory; a failed write leaves the
    /// in-memory value untouched.
    pub fn set_from_measurement(
        &self,
        known_distance_m: f64,
        bbox_height_px: i32,
    ) -> Result<CalibrationOutcome, CalibrationError> {
        if !(known_distance_m > 0.0) {
            return Err(CalibrationError::InvalidDistance(known_distance_m));
        }
        if bbox_height_px <= 0 {
            return Err(CalibrationError::NoObjectDetected);
        }

        let k = known_distance_m * bbox_height_px as f64;

        let mut guard = self
            .k
            .write()
            .map_err(|e| CalibrationError::Store(format!("Lock error: {}", e)))?;

        let persisted = PersistedCalibration { k: Some(k) };
        let json = serde_json::to_string(&persisted)
            .map_err(|e| CalibrationError::Store(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| CalibrationError::Store(e.to_string()))?;

        *guard = Some(k);
        info!(k, bbox_height_px, known_distance_m, "calibration updated");

        Ok(CalibrationOutcome {
            k,
            bbox_height: bbox_height_px,
            distance_m: known_distance_m,
        })
    }

    /// Clear the constant and delete the persisted file.
    ///
    /// Idempotent: resetting an uncalibrated store succeeds.
    pub fn reset(&self) -> Result<(), CalibrationError> {
        let mut guard = self
            .k
            .write()
            .map_err(|e| CalibrationError::Store(format!("Lock error: {}", e)))?;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "deleted calibration file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CalibrationError::Store(e.to_string())),
        }

        *guard = None;
        info!("calibration reset");
        Ok(())
    }
}

/// Pick the greatest bounding-box height among detections, the proxy for
/// the most prominent object in frame.
pub fn best_height(detections: &[Detection]) -> Option<i32> {
    detections
        .iter()
        .map(|d| d.height())
        .filter(|h| *h > 0)
        .max()
}
