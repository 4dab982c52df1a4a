//! Distance and side classification
//!
//! Pure helpers shared by detection enrichment, calibration, and the
//! obstacle scan. No state, no side effects.

use serde::{Deserialize, Serialize};

/// Guard against division by zero for degenerate heights
pub const HEIGHT_EPSILON: f64 = 1e-6;

/// Left side boundary as a percentage of frame width
pub const LEFT_BOUNDARY_PERCENT: i64 = 33;

/// Right side boundary as a percentage of frame width
pub const RIGHT_BOUNDARY_PERCENT: i64 = 66;

/// Horizontal position bucket of an object in the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    #[default]
    Center,
    Right,
}

impl Side {
    /// Classify a centroid x coordinate against the frame width.
    ///
    /// Exact rational comparison: `cx < w * 0.33` is left, `cx > w * 0.66`
    /// is right, boundaries fall to center.
    pub fn classify(cx: i32, frame_width: u32) -> Side {
        let cx = cx as i64;
        let w = frame_width as i64;
        if cx * 100 < w * LEFT_BOUNDARY_PERCENT {
            Side::Left
        } else if cx * 100 > w * RIGHT_BOUNDARY_PERCENT {
            Side::Right
        } else {
            Side::Center
        }
    }

    /// Spoken-style name ("left", "center", "right")
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Center => "center",
            Side::Right => "right",
        }
    }
}

/// Estimate distance in meters from a bounding-box pixel height.
///
/// Returns `None` when no calibration constant is available.
pub fn distance_for_height(k: Option<f64>, height_px: f64) -> Option<f64> {
    k.map(|k| k / (height_px + HEIGHT_EPSILON))
}

/// Render a distance estimate for speech output.
///
/// `None` renders as "?"; ten meters and beyond as whole meters; one meter
/// and beyond with one decimal; closer distances as whole centimeters
/// (truncated).
pub fn format_distance(distance: Option<f64>) -> String {
    match distance {
        None => "?".to_string(),
        Some(d) if d >= 10.0 => format!("{:.0} m", d),
        Some(d) if d >= 1.0 => format!("{:.1} m", d),
        Some(d) => format!("{} cm", (d * 100.0) as i64),
    }
}
