//! Object detector boundary

use frame_ingest::Frame;
use serde::{Deserialize, Serialize};

use crate::PerceptionError;

/// Raw detection as produced by the detector/tracker model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    /// Bounding box [x1, y1, x2, y2] in pixels
    pub bbox: [i32; 4],

    /// Class label
    pub class_name: String,

    /// Detection confidence (0-1)
    pub confidence: f32,

    /// Persistent track id when the tracker assigned one
    pub track_id: Option<u32>,
}

impl RawDetection {
    /// Create a detection without a track id
    pub fn new(bbox: [i32; 4], class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            class_name: class_name.into(),
            confidence,
            track_id: None,
        }
    }

    /// Attach a persistent track id
    pub fn with_track_id(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }
}

/// Object detection and tracking boundary
///
/// Implementations run the actual model; callers only depend on the
/// ordered detection list.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in the frame, in model output order
    fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, PerceptionError>;
}

/// Fixed-output detector for tests and model-free deployments
pub struct MockDetector {
    detections: Vec<RawDetection>,
}

impl MockDetector {
    /// Detector returning the given detections for every frame
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }

    /// Detector that never sees anything
    pub fn empty() -> Self {
        Self {
            detections: Vec::new(),
        }
    }
}

impl ObjectDetector for MockDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, PerceptionError> {
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame() -> Frame {
        Frame::new(vec![0; 48], 4, 4)
    }

    #[test]
    fn test_mock_returns_configured_detections() {
        let detector = MockDetector::new(vec![
            RawDetection::new([0, 0, 10, 20], "person", 0.9),
            RawDetection::new([5, 5, 15, 25], "chair", 0.7).with_track_id(3),
        ]);

        let detections = detector.detect(&test_frame()).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].class_name, "person");
        assert_eq!(detections[1].track_id, Some(3));
    }

    #[test]
    fn test_empty_mock() {
        let detector = MockDetector::empty();
        assert!(detector.detect(&test_frame()).unwrap().is_empty());
    }
}
