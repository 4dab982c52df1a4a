//! Detection enrichment
//!
//! Applies the confidence floor, sanitizes bounding boxes, and attaches
//! distance and side estimates to each surviving detection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{distance_for_height, format_distance, Side};
use crate::detector::RawDetection;

/// Detections below this confidence are discarded before enrichment
pub const DEFAULT_CONFIDENCE_FLOOR: f32 = 0.35;

/// Enriched detection, fresh per analyzed frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Class label
    pub class: String,

    /// Detection confidence (0-1)
    pub confidence: f32,

    /// Bounding box [x1, y1, x2, y2] clamped to frame bounds
    pub bbox: [i32; 4],

    /// Persistent track id when the tracker assigned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u32>,

    /// Estimated distance in meters (requires calibration)
    pub distance: Option<f64>,

    /// Spoken-style distance ("1.4 m", "42 cm", "?")
    pub distance_str: String,

    /// Horizontal position bucket
    pub side: Side,

    /// Centroid x
    pub cx: i32,

    /// Centroid y
    pub cy: i32,
}

impl Detection {
    /// Bounding box pixel height
    pub fn height(&self) -> i32 {
        self.bbox[3] - self.bbox[1]
    }
}

/// Enrich raw detector output against the current calibration constant.
///
/// Detector order is preserved; detections below the confidence floor or
/// degenerate after clamping are dropped.
pub fn enrich_detections(
    raw: Vec<RawDetection>,
    frame_width: u32,
    frame_height: u32,
    k: Option<f64>,
    confidence_floor: f32,
) -> Vec<Detection> {
    let w = frame_width as i32;
    let h = frame_height as i32;
    let mut enriched = Vec::with_capacity(raw.len());

    for det in raw {
        if det.confidence < confidence_floor {
            debug!(
                class = %det.class_name,
                confidence = det.confidence,
                "dropping low-confidence detection"
            );
            continue;
        }

        let x1 = det.bbox[0].clamp(0, w);
        let y1 = det.bbox[1].clamp(0, h);
        let x2 = det.bbox[2].clamp(0, w);
        let y2 = det.bbox[3].clamp(0, h);
        if x2 <= x1 || y2 <= y1 {
            debug!(class = %det.class_name, bbox = ?det.bbox, "dropping degenerate bbox");
            continue;
        }

        let cx = (x1 + x2) / 2;
        let cy = (y1 + y2) / 2;
        let height_px = (y2 - y1) as f64;

        let distance = distance_for_height(k, height_px);
        let distance_str = format_distance(distance);

        enriched.push(Detection {
            class: det.class_name,
            confidence: det.confidence,
            bbox: [x1, y1, x2, y2],
            track_id: det.track_id,
            distance: distance.map(|d| (d * 100.0).round() / 100.0),
            distance_str,
            side: Side::classify(cx, frame_width),
            cx,
            cy,
        });
    }

    enriched
}
