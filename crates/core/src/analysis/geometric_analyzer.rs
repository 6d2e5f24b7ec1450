//! Per-frame photometric and pose measurements of a face region.
//!
//! Every function here is pure and total: degenerate input (empty region,
//! empty frame, missing landmarks) yields a neutral value instead of an error.

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_result::{Landmarks, TransformMatrix};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Pixel stride for brightness sampling.
const BRIGHTNESS_STRIDE: usize = 2;

/// Pixel stride for the sharpness estimate.
const SHARPNESS_STRIDE: usize = 3;

/// ITU-R BT.601 luma weights.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Head pose in degrees. All zeros means "facing forward".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Orientation {
    pub fn within(&self, max_abs_deg: f64) -> bool {
        self.pitch.abs() < max_abs_deg && self.yaw.abs() < max_abs_deg && self.roll.abs() < max_abs_deg
    }
}

/// Where the pose estimate comes from, in order of preference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoseSource<'a> {
    Landmarks(&'a Landmarks),
    TransformMatrix(&'a TransformMatrix),
    None,
}

impl<'a> PoseSource<'a> {
    /// Picks landmarks when they resolve to eyes/nose/mouth, else the
    /// matrix, else nothing.
    pub fn select(
        landmarks: Option<&'a Landmarks>,
        matrix: Option<&'a TransformMatrix>,
    ) -> Self {
        match (landmarks, matrix) {
            (Some(lm), _) if lm.key_points().is_some() => PoseSource::Landmarks(lm),
            (_, Some(m)) => PoseSource::TransformMatrix(m),
            _ => PoseSource::None,
        }
    }
}

/// Mean luma over the region, sampling every second pixel on both axes.
pub fn brightness(frame: &Frame, region: &BoundingBox) -> f64 {
    let span = region.pixel_span(frame.width(), frame.height(), 0, 0);
    let mut sum = 0.0;
    let mut count = 0usize;

    for y in (span.y0..span.y1).step_by(BRIGHTNESS_STRIDE) {
        for x in (span.x0..span.x1).step_by(BRIGHTNESS_STRIDE) {
            let (r, g, b) = frame.rgb(x, y);
            sum += LUMA_R * r as f64 + LUMA_G * g as f64 + LUMA_B * b as f64;
            count += 1;
        }
    }

    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

/// Simplified Laplacian edge energy, `|2·p − right − down|` on the
/// channel-mean gray value, averaged over sampled interior pixels.
pub fn sharpness(frame: &Frame, region: &BoundingBox) -> f64 {
    let span = region.pixel_span(frame.width(), frame.height(), 1, 1);
    let gray = |x: usize, y: usize| -> f64 {
        let (r, g, b) = frame.rgb(x, y);
        (r as f64 + g as f64 + b as f64) / 3.0
    };

    let mut sum = 0.0;
    let mut count = 0usize;
    for y in (span.y0..span.y1.saturating_sub(1)).step_by(SHARPNESS_STRIDE) {
        for x in (span.x0..span.x1.saturating_sub(1)).step_by(SHARPNESS_STRIDE) {
            sum += (2.0 * gray(x, y) - gray(x + 1, y) - gray(x, y + 1)).abs();
            count += 1;
        }
    }

    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

pub fn orientation(source: PoseSource<'_>) -> Orientation {
    match source {
        PoseSource::Landmarks(lm) => from_landmarks(lm),
        PoseSource::TransformMatrix(m) => from_matrix(m),
        PoseSource::None => Orientation::default(),
    }
}

/// Whether the box center lies strictly within `tolerance` of the frame
/// center on both axes, in frame-normalized units.
pub fn is_centered(region: &BoundingBox, frame_w: u32, frame_h: u32, tolerance: f64) -> bool {
    if frame_w == 0 || frame_h == 0 {
        return false;
    }
    let (cx, cy) = region.center();
    let nx = cx / frame_w as f64;
    let ny = cy / frame_h as f64;
    (nx - 0.5).abs() < tolerance && (ny - 0.5).abs() < tolerance
}

/// Roll from the eye line; pitch and yaw from eye/nose/mouth distances.
fn from_landmarks(landmarks: &Landmarks) -> Orientation {
    let Some(kp) = landmarks.key_points() else {
        return Orientation::default();
    };

    let roll = (kp.right_eye.y - kp.left_eye.y)
        .atan2(kp.right_eye.x - kp.left_eye.x)
        .to_degrees();

    let eye_cx = (kp.left_eye.x + kp.right_eye.x) / 2.0;
    let eye_cy = (kp.left_eye.y + kp.right_eye.y) / 2.0;
    let eye_nose = (kp.nose.x - eye_cx).hypot(kp.nose.y - eye_cy);
    let eye_mouth = (kp.mouth.x - eye_cx).hypot(kp.mouth.y - eye_cy);
    let pitch = (eye_nose - eye_mouth).atan2(eye_mouth).to_degrees();

    let left = kp.nose.distance_2d(&kp.left_eye);
    let right = kp.nose.distance_2d(&kp.right_eye);
    let yaw = (left - right).atan2((left + right) / 2.0).to_degrees();

    Orientation { pitch, yaw, roll }
}

fn from_matrix(matrix: &TransformMatrix) -> Orientation {
    let m = matrix.values();
    Orientation {
        pitch: (-m[9]).clamp(-1.0, 1.0).asin().to_degrees(),
        yaw: m[8].atan2(m[10]).to_degrees(),
        roll: m[1].atan2(m[5]).to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::{LandmarkLayout, Point3};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn gray_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::filled(w, h, [value, value, value, 255], 0.0)
    }

    /// Vertical stripes: even columns black, odd columns white.
    fn striped_frame(w: u32, h: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 4) as usize);
        for _y in 0..h {
            for x in 0..w {
                let v = if x % 2 == 0 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Frame::new(data, w, h, 4, 0.0)
    }

    fn blaze(left_eye: (f64, f64), right_eye: (f64, f64), nose: (f64, f64), mouth: (f64, f64)) -> Landmarks {
        let p = |(x, y): (f64, f64)| Point3::new(x, y, 0.0);
        Landmarks::new(
            vec![p(left_eye), p(right_eye), p(nose), p(mouth), p((0.0, 0.0))],
            LandmarkLayout::BlazeFace,
        )
    }

    fn rotation_y(deg: f64) -> TransformMatrix {
        // Column-major rotation about the vertical axis
        let (s, c) = deg.to_radians().sin_cos();
        let mut m = TransformMatrix::identity().0;
        m[0] = c;
        m[2] = -s;
        m[8] = s;
        m[10] = c;
        TransformMatrix(m)
    }

    fn rotation_x(deg: f64) -> TransformMatrix {
        let (s, c) = deg.to_radians().sin_cos();
        let mut m = TransformMatrix::identity().0;
        m[5] = c;
        m[6] = s;
        m[9] = -s;
        m[10] = c;
        TransformMatrix(m)
    }

    // ── brightness ──────────────────────────────────────────────────

    #[test]
    fn test_brightness_uniform_gray() {
        let frame = gray_frame(64, 48, 100);
        let b = brightness(&frame, &BoundingBox::new(8.0, 8.0, 32.0, 32.0));
        assert_relative_eq!(b, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_brightness_luma_weights() {
        let frame = Frame::filled(10, 10, [255, 0, 0, 255], 0.0);
        let b = brightness(&frame, &BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_relative_eq!(b, 0.299 * 255.0, epsilon = 1e-9);
    }

    #[test]
    fn test_brightness_samples_every_second_pixel() {
        // Only even columns are sampled, and those are black
        let frame = striped_frame(20, 10);
        let b = brightness(&frame, &BoundingBox::new(0.0, 0.0, 20.0, 10.0));
        assert_relative_eq!(b, 0.0);
    }

    #[test]
    fn test_brightness_clamps_region_to_frame() {
        let frame = gray_frame(20, 20, 200);
        let b = brightness(&frame, &BoundingBox::new(-100.0, -100.0, 1000.0, 1000.0));
        assert_relative_eq!(b, 200.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case::zero_size(BoundingBox::new(5.0, 5.0, 0.0, 0.0))]
    #[case::outside(BoundingBox::new(500.0, 500.0, 10.0, 10.0))]
    fn test_brightness_degenerate_region_is_zero(#[case] region: BoundingBox) {
        let frame = gray_frame(20, 20, 200);
        assert_relative_eq!(brightness(&frame, &region), 0.0);
    }

    #[test]
    fn test_brightness_empty_frame_is_zero() {
        let frame = Frame::new(Vec::new(), 0, 0, 4, 0.0);
        assert_relative_eq!(brightness(&frame, &BoundingBox::new(0.0, 0.0, 10.0, 10.0)), 0.0);
    }

    // ── sharpness ───────────────────────────────────────────────────

    #[test]
    fn test_sharpness_flat_region_is_zero() {
        let frame = gray_frame(40, 40, 90);
        assert_relative_eq!(sharpness(&frame, &BoundingBox::new(0.0, 0.0, 40.0, 40.0)), 0.0);
    }

    #[test]
    fn test_sharpness_detects_edges() {
        // Sampled columns 1, 4, 7, ... alternate parity, so every sample
        // sits on a 255 step to its right neighbour
        let frame = striped_frame(40, 40);
        let s = sharpness(&frame, &BoundingBox::new(0.0, 0.0, 40.0, 40.0));
        assert_relative_eq!(s, 255.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sharpness_tiny_region_is_zero() {
        let frame = striped_frame(40, 40);
        assert_relative_eq!(sharpness(&frame, &BoundingBox::new(10.0, 10.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_sharpness_region_past_edges_stays_in_bounds() {
        let frame = striped_frame(12, 9);
        let s = sharpness(&frame, &BoundingBox::new(-5.0, -5.0, 100.0, 100.0));
        assert!(s > 0.0);
    }

    // ── orientation ─────────────────────────────────────────────────

    #[test]
    fn test_orientation_none_is_forward() {
        assert_eq!(orientation(PoseSource::None), Orientation::default());
    }

    #[test]
    fn test_orientation_frontal_landmarks() {
        // Nose midway between the eyes, nose and mouth distances equal
        let lm = blaze((0.4, 0.4), (0.6, 0.4), (0.5, 0.5), (0.5, 0.5));
        let o = orientation(PoseSource::Landmarks(&lm));
        assert_relative_eq!(o.roll, 0.0, epsilon = 1e-9);
        assert_relative_eq!(o.yaw, 0.0, epsilon = 1e-9);
        assert_relative_eq!(o.pitch, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_roll_from_tilted_eye_line() {
        let lm = blaze((0.4, 0.4), (0.6, 0.6), (0.5, 0.5), (0.45, 0.65));
        let o = orientation(PoseSource::Landmarks(&lm));
        assert_relative_eq!(o.roll, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_pitch_from_nose_mouth_ratio() {
        // eye center (0.5, 0.4); nose 0.1 below, mouth 0.2 below
        let lm = blaze((0.4, 0.4), (0.6, 0.4), (0.5, 0.5), (0.5, 0.6));
        let o = orientation(PoseSource::Landmarks(&lm));
        assert_relative_eq!(o.pitch, (-0.1f64).atan2(0.2).to_degrees(), epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_yaw_sign_follows_nose_offset() {
        // Nose closer to the right eye: left distance larger, positive yaw
        let lm = blaze((0.4, 0.4), (0.6, 0.4), (0.58, 0.5), (0.5, 0.6));
        let o = orientation(PoseSource::Landmarks(&lm));
        assert!(o.yaw > 0.0);
    }

    #[test]
    fn test_orientation_from_matrix_yaw() {
        let m = rotation_y(30.0);
        let o = orientation(PoseSource::TransformMatrix(&m));
        assert_relative_eq!(o.yaw, 30.0, epsilon = 1e-9);
        assert_relative_eq!(o.pitch, 0.0, epsilon = 1e-9);
        assert_relative_eq!(o.roll, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_from_matrix_pitch() {
        let m = rotation_x(20.0);
        let o = orientation(PoseSource::TransformMatrix(&m));
        assert_relative_eq!(o.pitch, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_from_matrix_out_of_range_is_finite() {
        let mut m = TransformMatrix::identity();
        m.0[9] = -3.0;
        let o = orientation(PoseSource::TransformMatrix(&m));
        assert_relative_eq!(o.pitch, 90.0, epsilon = 1e-9);
    }

    // ── PoseSource::select ──────────────────────────────────────────

    #[test]
    fn test_select_prefers_landmarks() {
        let lm = blaze((0.4, 0.4), (0.6, 0.4), (0.5, 0.5), (0.5, 0.6));
        let m = TransformMatrix::identity();
        assert!(matches!(
            PoseSource::select(Some(&lm), Some(&m)),
            PoseSource::Landmarks(_)
        ));
    }

    #[test]
    fn test_select_falls_back_to_matrix_for_sparse_landmarks() {
        let sparse = Landmarks::new(vec![Point3::default(); 3], LandmarkLayout::BlazeFace);
        let m = TransformMatrix::identity();
        assert!(matches!(
            PoseSource::select(Some(&sparse), Some(&m)),
            PoseSource::TransformMatrix(_)
        ));
    }

    #[test]
    fn test_select_none_when_nothing_usable() {
        let sparse = Landmarks::new(Vec::new(), LandmarkLayout::FaceMesh);
        assert_eq!(PoseSource::select(Some(&sparse), None), PoseSource::None);
        assert_eq!(PoseSource::select(None, None), PoseSource::None);
    }

    // ── centering ───────────────────────────────────────────────────

    #[rstest]
    #[case::centered(BoundingBox::new(270.0, 190.0, 100.0, 100.0), true)]
    #[case::far_left(BoundingBox::new(0.0, 190.0, 40.0, 100.0), false)]
    #[case::far_bottom(BoundingBox::new(270.0, 440.0, 100.0, 40.0), false)]
    fn test_is_centered(#[case] region: BoundingBox, #[case] expected: bool) {
        assert_eq!(is_centered(&region, 640, 480, 0.4), expected);
    }

    #[test]
    fn test_is_centered_empty_frame() {
        assert!(!is_centered(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0, 0, 0.4));
    }

    #[test]
    fn test_orientation_within_is_strict() {
        let o = Orientation {
            pitch: 25.0,
            yaw: 0.0,
            roll: 0.0,
        };
        assert!(!o.within(25.0));
        assert!(o.within(25.1));
    }
}
