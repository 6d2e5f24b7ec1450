use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("face percentage bounds must lie in 0..=100, got {min}..={max}")]
    FaceRangeOutOfBounds { min: f64, max: f64 },
    #[error("minimum face percentage {min} exceeds maximum {max}")]
    InvertedFaceRange { min: f64, max: f64 },
    #[error("minimum brightness must lie in 0..=255, got {0}")]
    BrightnessOutOfBounds(f64),
    #[error("orientation limit must be positive, got {0}")]
    OrientationLimit(f64),
    #[error("centering tolerance must lie in (0, 0.5], got {0}")]
    CenteringTolerance(f64),
}

/// Capture quality thresholds.
///
/// Fixed for the lifetime of a capture loop. The size window is
/// deliberately narrow: the subject must stand at a nearly exact distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub min_face_percentage: f64,
    pub max_face_percentage: f64,
    pub min_brightness: f64,
    pub max_abs_orientation_deg: f64,
    pub centering_tolerance: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_face_percentage: 37.0,
            max_face_percentage: 40.0,
            min_brightness: 80.0,
            max_abs_orientation_deg: 25.0,
            centering_tolerance: 0.4,
        }
    }
}

impl ValidationPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        let (min, max) = (self.min_face_percentage, self.max_face_percentage);
        if !(0.0..=100.0).contains(&min) || !(0.0..=100.0).contains(&max) {
            return Err(PolicyError::FaceRangeOutOfBounds { min, max });
        }
        if min > max {
            return Err(PolicyError::InvertedFaceRange { min, max });
        }
        if !(0.0..=255.0).contains(&self.min_brightness) {
            return Err(PolicyError::BrightnessOutOfBounds(self.min_brightness));
        }
        if self.max_abs_orientation_deg.is_nan() || self.max_abs_orientation_deg <= 0.0 {
            return Err(PolicyError::OrientationLimit(self.max_abs_orientation_deg));
        }
        if !(f64::EPSILON..=0.5).contains(&self.centering_tolerance) {
            return Err(PolicyError::CenteringTolerance(self.centering_tolerance));
        }
        Ok(())
    }

    pub fn face_size_in_range(&self, face_percentage: f64) -> bool {
        face_percentage >= self.min_face_percentage && face_percentage <= self.max_face_percentage
    }
}
