use thiserror::Error;

use crate::detection::domain::detection_result::FrameDetections;
use crate::shared::frame::Frame;

/// Port to the external face detection / landmarking engine.
///
/// Called once per processed tick, never concurrently. Implementations may
/// keep state between frames (e.g. video-mode inference), hence `&mut self`.
/// Errors are transient: the scheduler logs them and skips the tick.
pub trait DetectionAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<FrameDetections, Box<dyn std::error::Error>>;
}

/// The engine could not be constructed on any backend.
///
/// Terminal for the capture loop: the status stays "unavailable" until the
/// host builds a new engine.
#[derive(Error, Debug)]
pub enum InitializationError {
    #[error("detection model not available: {0}")]
    Model(String),
    #[error("accelerated backend failed ({accelerated}); CPU fallback failed ({fallback})")]
    AllBackendsFailed { accelerated: String, fallback: String },
}
