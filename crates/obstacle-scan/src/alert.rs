//! Wall alert construction and cooldown gating
//!
//! Turns a fused wall observation into a spoken-style alert and suppresses
//! repeats. The gate checks the cooldown before the alert is built and
//! commits a timestamp only when an alert is actually produced, so a frame
//! that yields no alert never delays the next one.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fusion::WallObservation;

/// Minimum spacing between consecutive wall alerts
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(3);

/// Alert distance tiers, in metres
const URGENT_DISTANCE_M: f64 = 1.0;
const WARNING_DISTANCE_M: f64 = 2.0;
const NOTICE_DISTANCE_M: f64 = 3.0;

/// A wall alert ready for wire serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallAlert {
    pub detected: bool,
    pub distance: Option<f64>,
    pub distance_str: String,
    pub position: String,
    pub message: String,
    pub urgent: bool,
}

/// Build the alert an observation warrants, if any.
///
/// Observations beyond the notice tier stay silent. A detection whose
/// distance is unknown gets a non-urgent notice so the user still hears
/// about it.
pub fn wall_alert_for(observation: &WallObservation) -> Option<WallAlert> {
    if !observation.detected {
        return None;
    }
    let phrase = observation.position.phrase();
    let (message, urgent) = match observation.distance {
        None => (format!("Obstacle detected {}.", phrase), false),
        Some(d) if d < URGENT_DISTANCE_M => (
            format!(
                "Stop immediately! Obstacle {} {}.",
                observation.distance_str, phrase
            ),
            true,
        ),
        Some(d) if d < WARNING_DISTANCE_M => (
            format!(
                "Slow down. Obstacle {} {}.",
                observation.distance_str, phrase
            ),
            false,
        ),
        Some(d) if d < NOTICE_DISTANCE_M => (
            format!("Obstacle {} {}.", observation.distance_str, phrase),
            false,
        ),
        Some(_) => return None,
    };
    Some(WallAlert {
        detected: true,
        distance: observation.distance,
        distance_str: observation.distance_str.clone(),
        position: observation.position.as_str().to_string(),
        message,
        urgent,
    })
}

/// Cooldown gate over alert emission
pub struct AlertGate {
    last_alert: Mutex<Option<Instant>>,
    cooldown: Duration,
}

impl AlertGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_alert: Mutex::new(None),
            cooldown,
        }
    }

    /// Emit the alert `build` produces, unless the cooldown is still
    /// running. `build` is not called while gated, and the cooldown
    /// timestamp moves only when an alert is actually emitted.
    pub fn try_emit<T>(&self, build: impl FnOnce() -> Option<T>) -> Option<T> {
        let Ok(mut last) = self.last_alert.lock() else {
            warn!("alert gate lock poisoned, suppressing alert");
            return None;
        };
        if let Some(at) = *last {
            if at.elapsed() < self.cooldown {
                return None;
            }
        }
        let alert = build()?;
        *last = Some(Instant::now());
        Some(alert)
    }
}

impl Default for AlertGate {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_COOLDOWN)
    }
}
