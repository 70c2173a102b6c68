//! # Detection Module
//!
//! Interface to the external face detection primitive.
//!
//! The detector itself (a pretrained model) lives outside this crate. The
//! scan flow only needs to know whether a frame contains a face, so the
//! contract is `detect(frame) -> Option<Detection>`, where an `Err` means the
//! detector could not run at all.

use crate::upload::DataUri;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A still image handed to the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Encode as a data URI for session storage or the API.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        DataUri::new(self.mime.clone(), self.bytes.clone()).encode()
    }
}

/// Pixel-space point (landmark).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Face bounding box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A positive detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector confidence in 0.0..=1.0.
    pub score: f32,
    pub bounding_box: BoundingBox,
    /// 68-point landmarks when the landmark net ran.
    pub landmarks: Option<Vec<Point>>,
}

impl Detection {
    #[must_use]
    pub fn new(score: f32, bounding_box: BoundingBox) -> Self {
        Self {
            score,
            bounding_box,
            landmarks: None,
        }
    }

    #[must_use]
    pub fn with_landmarks(mut self, landmarks: Vec<Point>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// Why the detector could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    /// A required model net has not been loaded.
    #[error("model '{0}' is not loaded")]
    ModelNotLoaded(String),

    /// The detector failed while running.
    #[error("detector failure: {0}")]
    Backend(String),
}

/// The external detection primitive.
pub trait FaceDetector {
    /// Look for a face. `Ok(None)` is a clean negative.
    fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError>;
}

impl<D: FaceDetector + ?Sized> FaceDetector for &D {
    fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError> {
        (**self).detect(frame)
    }
}

impl<D: FaceDetector + ?Sized> FaceDetector for std::sync::Arc<D> {
    fn detect(&self, frame: &Frame) -> Result<Option<Detection>, DetectError> {
        (**self).detect(frame)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Fixed(Option<Detection>);

    impl FaceDetector for Fixed {
        fn detect(&self, _frame: &Frame) -> Result<Option<Detection>, DetectError> {
            Ok(self.0.clone())
        }
    }

    fn face() -> Detection {
        Detection::new(
            0.9,
            BoundingBox {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 120.0,
            },
        )
    }

    #[test]
    fn frame_encodes_as_data_uri() {
        let frame = Frame::new("image/jpeg", vec![1, 2, 3, 4]);
        assert_eq!(frame.to_data_uri(), "data:image/jpeg;base64,AQIDBA==");
    }

    #[test]
    fn detector_through_references() {
        let detector = Arc::new(Fixed(Some(face())));
        let frame = Frame::new("image/jpeg", vec![]);
        assert!(detector.detect(&frame).unwrap().is_some());
        assert!((&*detector).detect(&frame).unwrap().is_some());
    }

    #[test]
    fn detection_with_landmarks() {
        let detection = face().with_landmarks(vec![Point { x: 1.0, y: 2.0 }]);
        assert_eq!(detection.landmarks.map(|l| l.len()), Some(1));
    }

    #[test]
    fn detect_error_messages() {
        let err = DetectError::ModelNotLoaded("tiny_face_detector".into());
        assert_eq!(err.to_string(), "model 'tiny_face_detector' is not loaded");
    }
}
