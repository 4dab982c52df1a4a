//! Frame-level wall scan
//!
//! Produces the geometric half of the wall evidence: edge extraction,
//! line segments, a vertical-structure vote, and a coarse distance proxy
//! from the central region of the frame. The proxy reuses the monocular
//! object-calibration constant against the region's pixel height; it is a
//! deliberate approximation, not a depth measurement.

use frame_ingest::Frame;
use image::GrayImage;
use perception::classify::HEIGHT_EPSILON;
use serde::Deserialize;
use tracing::debug;

use crate::hough::{detect_segments, HoughParams};
use crate::{ScanError, WallPosition};

/// Wall scan configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Canny low threshold
    pub canny_low: f32,
    /// Canny high threshold
    pub canny_high: f32,
    /// Line-segment extraction parameters
    pub hough: HoughParams,
    /// Minimum total segments before a hypothesis is formed
    pub min_total_segments: usize,
    /// Segments with horizontal extent below this count as near-vertical
    pub vertical_dx_limit: i32,
    /// More than this many near-vertical segments confirm a detection
    pub min_vertical_segments: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough: HoughParams::default(),
            min_total_segments: 10,
            vertical_dx_limit: 20,
            min_vertical_segments: 5,
        }
    }
}

/// Geometric outcome of a single wall scan
#[derive(Debug, Clone, PartialEq)]
pub enum WallEvidence {
    /// No calibration constant; the scan cannot run
    Uncalibrated,
    /// Too few segments to say anything about the frame
    NoHypothesis,
    /// Enough structure to judge, and it does not look like a wall
    ConfidentNegative,
    /// Wall-like vertical structure found
    Detected {
        distance: Option<f64>,
        position: WallPosition,
    },
}

/// Geometric wall scanner
pub struct WallScanner {
    config: ScanConfig,
}

impl WallScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan a frame for wall-like structure.
    ///
    /// Requires a calibration constant; without one the scan returns
    /// [`WallEvidence::Uncalibrated`] immediately and never blocks the
    /// rest of the analysis.
    pub fn scan(&self, frame: &Frame, k: Option<f64>) -> Result<WallEvidence, ScanError> {
        let k = match k {
            Some(k) => k,
            None => return Ok(WallEvidence::Uncalibrated),
        };

        let (w, h) = (frame.width, frame.height);
        let gray = GrayImage::from_raw(w, h, frame.to_grayscale())
            .ok_or_else(|| ScanError::EdgeMap(format!("grayscale buffer for {}x{}", w, h)))?;

        let edges = imageproc::edges::canny(&gray, self.config.canny_low, self.config.canny_high);
        let segments = detect_segments(&edges, &self.config.hough);

        if segments.len() < self.config.min_total_segments {
            debug!(segments = segments.len(), "too sparse for a wall hypothesis");
            return Ok(WallEvidence::NoHypothesis);
        }

        // Central region: middle third of height, middle half of width.
        // Its pixel height drives the distance proxy.
        let (x0, x1) = (w / 4, 3 * w / 4);
        let (y0, y1) = (h / 3, 2 * h / 3);
        let region_height = frame
            .crop(x0, y0, x1 - x0, y1 - y0)
            .map(|region| region.height)
            .unwrap_or(0);
        let distance = k / (region_height as f64 + HEIGHT_EPSILON);

        let verticals: Vec<_> = segments
            .iter()
            .filter(|s| s.dx() < self.config.vertical_dx_limit)
            .collect();

        if verticals.len() <= self.config.min_vertical_segments {
            debug!(
                total = segments.len(),
                vertical = verticals.len(),
                "structure present but not wall-like"
            );
            return Ok(WallEvidence::ConfidentNegative);
        }

        let center = (w / 2) as i32;
        let band = (w / 6) as i32;
        let left_count = verticals
            .iter()
            .filter(|s| s.midpoint_x() < center - band)
            .count();
        let right_count = verticals
            .iter()
            .filter(|s| s.midpoint_x() > center + band)
            .count();
        let position = if left_count > right_count {
            WallPosition::Left
        } else if right_count > left_count {
            WallPosition::Right
        } else {
            WallPosition::Center
        };

        debug!(
            total = segments.len(),
            vertical = verticals.len(),
            left_count,
            right_count,
            distance,
            "wall detected"
        );

        Ok(WallEvidence::Detected {
            distance: Some(distance),
            position,
        })
    }
}
