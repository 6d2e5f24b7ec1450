//! Per-frame output of the external detection engine.
//!
//! Landmark coordinates are normalized to `0..1` of the frame; bounding
//! boxes are in pixels. The pipeline reads these values and never edits them.

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

/// Landmark sets with fewer points than this are treated as absent.
pub const MIN_LANDMARK_POINTS: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_2d(&self, other: &Point3) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Index scheme of a landmark list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkLayout {
    /// Dense 468/478-point face mesh.
    #[default]
    FaceMesh,
    /// BlazeFace's six keypoints: eyes, nose, mouth, ears.
    BlazeFace,
}

impl LandmarkLayout {
    /// Indices of `[image-left eye, image-right eye, nose tip, mouth]`.
    pub fn key_indices(&self) -> [usize; 4] {
        match self {
            LandmarkLayout::FaceMesh => [33, 263, 4, 13],
            LandmarkLayout::BlazeFace => [0, 1, 2, 3],
        }
    }
}

/// The four points the orientation estimate and the overlay rely on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyPoints {
    pub left_eye: Point3,
    pub right_eye: Point3,
    pub nose: Point3,
    pub mouth: Point3,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    pub points: Vec<Point3>,
    #[serde(default)]
    pub layout: LandmarkLayout,
}

impl Landmarks {
    pub fn new(points: Vec<Point3>, layout: LandmarkLayout) -> Self {
        Self { points, layout }
    }

    /// Resolves eyes, nose and mouth, or `None` when the set is too sparse.
    pub fn key_points(&self) -> Option<KeyPoints> {
        if self.points.len() < MIN_LANDMARK_POINTS {
            return None;
        }
        let [l, r, n, m] = self.layout.key_indices();
        Some(KeyPoints {
            left_eye: *self.points.get(l)?,
            right_eye: *self.points.get(r)?,
            nose: *self.points.get(n)?,
            mouth: *self.points.get(m)?,
        })
    }

    /// Key points that exist in the list, in overlay order; missing ones
    /// are skipped rather than failing the whole set.
    pub fn overlay_points(&self) -> impl Iterator<Item = &Point3> + '_ {
        self.layout
            .key_indices()
            .into_iter()
            .filter_map(|i| self.points.get(i))
    }
}

/// Column-major 4×4 face pose matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformMatrix(pub [f64; 16]);

impl TransformMatrix {
    pub fn identity() -> Self {
        let mut m = [0.0; 16];
        for i in 0..4 {
            m[i * 5] = 1.0;
        }
        Self(m)
    }

    /// Accepts any slice with at least 16 values; shorter ones are rejected.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let head: [f64; 16] = values.get(..16)?.try_into().ok()?;
        Some(Self(head))
    }

    pub fn values(&self) -> &[f64; 16] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub landmarks: Option<Landmarks>,
    #[serde(default)]
    pub transform_matrix: Option<TransformMatrix>,
}

impl DetectionResult {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            landmarks: None,
            transform_matrix: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: Landmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// Everything the adapter reports for one frame.
///
/// `landmarks` and `transform_matrix` come from a separate landmarking pass
/// and describe at most one primary face.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub detections: Vec<DetectionResult>,
    #[serde(default)]
    pub landmarks: Option<Landmarks>,
    #[serde(default)]
    pub transform_matrix: Option<TransformMatrix>,
}

impl FrameDetections {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Detections with the primary-face pose attached to a lone detection
    /// that carries none of its own. Multi-face results pass through as-is.
    pub fn into_resolved(self) -> Vec<DetectionResult> {
        let FrameDetections {
            mut detections,
            landmarks,
            transform_matrix,
        } = self;
        if let [only] = detections.as_mut_slice() {
            if only.landmarks.is_none() {
                only.landmarks = landmarks;
            }
            if only.transform_matrix.is_none() {
                only.transform_matrix = transform_matrix;
            }
        }
        detections
    }
}
