use crate::analysis::geometric_analyzer::{self, PoseSource};
use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::frame::Frame;

use super::policy::ValidationPolicy;
use super::status::{
    Checks, GeometricMetrics, StatusDetails, ValidationStatus, Verdict, MSG_ADJUST, MSG_READY,
};

/// Maps one frame's detections to a verdict.
///
/// Pure: the same `(detections, frame, policy)` always yields an equal
/// status. Zero or several faces short-circuit before any pixel work.
pub fn evaluate(
    detections: &[DetectionResult],
    frame: &Frame,
    policy: &ValidationPolicy,
) -> ValidationStatus {
    let detection = match detections {
        [] => return ValidationStatus::no_face(),
        [only] => only,
        _ => return ValidationStatus::multiple_faces(),
    };

    let metrics = measure(detection, frame, policy);
    let checks = Checks {
        has_face: true,
        single_face: true,
        face_size_in_range: policy.face_size_in_range(metrics.face_percentage),
        brightness: metrics.brightness >= policy.min_brightness,
        centered: metrics.centered,
        orientation: metrics.orientation.within(policy.max_abs_orientation_deg),
    };
    let can_capture = checks.can_capture();

    let (color, message) = if !checks.face_size_in_range {
        (Verdict::Yellow, size_message(metrics.face_percentage, policy))
    } else if !checks.brightness {
        (
            Verdict::Yellow,
            format!(
                "Iluminación insuficiente ({} - necesitas >= {})",
                metrics.brightness.round(),
                policy.min_brightness
            ),
        )
    } else if can_capture {
        (Verdict::Green, MSG_READY.to_string())
    } else {
        (Verdict::Yellow, MSG_ADJUST.to_string())
    };

    ValidationStatus {
        is_valid: can_capture,
        color,
        message,
        details: Some(StatusDetails {
            metrics,
            checks,
            bounding_box: detection.bounding_box,
        }),
    }
}

fn measure(detection: &DetectionResult, frame: &Frame, policy: &ValidationPolicy) -> GeometricMetrics {
    let bbox = &detection.bounding_box;
    let frame_area = frame.area();
    let face_percentage = if frame_area > 0.0 {
        bbox.area() / frame_area * 100.0
    } else {
        0.0
    };
    let pose = PoseSource::select(
        detection.landmarks.as_ref(),
        detection.transform_matrix.as_ref(),
    );

    GeometricMetrics {
        face_percentage,
        brightness: geometric_analyzer::brightness(frame, bbox),
        sharpness: geometric_analyzer::sharpness(frame, bbox),
        orientation: geometric_analyzer::orientation(pose),
        centered: geometric_analyzer::is_centered(
            bbox,
            frame.width(),
            frame.height(),
            policy.centering_tolerance,
        ),
    }
}

fn size_message(face_percentage: f64, policy: &ValidationPolicy) -> String {
    // Halves round up and negative zero prints as "0"
    let shown = (face_percentage + 0.5).floor() + 0.0;
    let hint = if face_percentage < policy.min_face_percentage {
        "Acércate más"
    } else {
        "Aléjate un poco"
    };
    format!(
        "{hint} ({shown}% - necesitas entre {}% y {}%)",
        policy.min_face_percentage,
        policy.max_face_percentage
    )
}
