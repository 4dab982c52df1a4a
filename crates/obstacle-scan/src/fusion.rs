//! Wall evidence fusion
//!
//! Merges the geometric scan outcome with textual evidence from the scene
//! caption. Precedence is fixed:
//! - Geometric evidence is primary.
//! - Text may upgrade a sparse frame (no hypothesis) to a detection ahead.
//! - Text mentioning closeness may tighten a distance estimate downward,
//!   never loosen it.
//! - A confident geometric negative is never overridden by text.

use perception::format_distance;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scan::WallEvidence;
use crate::WallPosition;

/// Distance assigned when text indicates closeness
const NEAR_CLAMP_M: f64 = 1.5;

/// A caption-sourced estimate is tightened only past this distance
const NEAR_THRESHOLD_M: f64 = 2.0;

/// Textual wall evidence extracted from a scene caption
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextEvidence {
    /// Caption mentions a wall or barrier
    pub mentions_wall: bool,
    /// Caption mentions closeness ("close"/"near")
    pub mentions_near: bool,
}

impl TextEvidence {
    /// Extract evidence flags from a caption, when one was generated this
    /// call.
    pub fn from_caption(caption: Option<&str>) -> Self {
        let Some(text) = caption else {
            return Self::default();
        };
        let lower = text.to_lowercase();
        Self {
            mentions_wall: lower.contains("wall") || lower.contains("barrier"),
            mentions_near: lower.contains("close") || lower.contains("near"),
        }
    }
}

/// Fused per-frame wall assessment, reported with every analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallObservation {
    pub detected: bool,
    pub distance: Option<f64>,
    pub distance_str: String,
    pub position: WallPosition,
}

impl WallObservation {
    fn not_detected() -> Self {
        Self {
            detected: false,
            distance: None,
            distance_str: format_distance(None),
            position: WallPosition::Unknown,
        }
    }

    fn detected(distance: Option<f64>, position: WallPosition) -> Self {
        Self {
            detected: true,
            distance: distance.map(|d| (d * 100.0).round() / 100.0),
            distance_str: format_distance(distance),
            position,
        }
    }
}

/// Fuse geometric and textual wall evidence under the documented
/// precedence.
pub fn fuse(evidence: WallEvidence, text: TextEvidence) -> WallObservation {
    match evidence {
        // The scan never ran; nothing for text to corroborate
        WallEvidence::Uncalibrated => WallObservation::not_detected(),

        // A confident geometric negative outranks any caption
        WallEvidence::ConfidentNegative => WallObservation::not_detected(),

        WallEvidence::NoHypothesis => {
            if text.mentions_wall {
                let distance = text.mentions_near.then_some(NEAR_CLAMP_M);
                debug!(?distance, "caption upgraded sparse frame to detection");
                WallObservation::detected(distance, WallPosition::Ahead)
            } else {
                WallObservation::not_detected()
            }
        }

        WallEvidence::Detected { distance, position } => {
            let tighten = text.mentions_wall
                && text.mentions_near
                && distance.map_or(true, |d| d > NEAR_THRESHOLD_M);
            let distance = if tighten {
                debug!(?distance, "caption tightened wall distance");
                Some(NEAR_CLAMP_M)
            } else {
                distance
            };
            WallObservation::detected(distance, position)
        }
    }
}
