//! Obstacle and Wall Detection
//!
//! Geometric hazard analysis for the vision assistance pipeline:
//! - Edge and line-segment extraction over the incoming frame
//! - A vertical-structure vote that flags wall-like obstacles
//! - Fusion with textual evidence from the scene caption
//! - Tiered, cooldown-gated alert emission
//!
//! Geometric evidence is primary. Caption text may upgrade a sparse frame
//! to a detection or tighten a distance estimate downward, but it never
//! overrides a confident geometric negative.

pub mod alert;
pub mod fusion;
pub mod hough;
pub mod scan;

pub use alert::{wall_alert_for, AlertGate, WallAlert, DEFAULT_ALERT_COOLDOWN};
pub use fusion::{fuse, TextEvidence, WallObservation};
pub use hough::{detect_segments, HoughParams, Segment};
pub use scan::{ScanConfig, WallEvidence, WallScanner};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scan error types
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Edge map construction failed: {0}")]
    EdgeMap(String),
}

/// Reported position of a detected wall or obstacle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallPosition {
    Left,
    Center,
    Right,
    /// Textual evidence placed it in front without a geometric position
    Ahead,
    #[default]
    Unknown,
}

impl WallPosition {
    /// Lowercase wire label, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WallPosition::Left => "left",
            WallPosition::Center => "center",
            WallPosition::Right => "right",
            WallPosition::Ahead => "ahead",
            WallPosition::Unknown => "unknown",
        }
    }

    /// Spoken-style phrase for alert messages
    pub fn phrase(&self) -> &'static str {
        match self {
            WallPosition::Left => "on your left",
            WallPosition::Right => "on your right",
            WallPosition::Center | WallPosition::Ahead | WallPosition::Unknown => "ahead",
        }
    }
}
