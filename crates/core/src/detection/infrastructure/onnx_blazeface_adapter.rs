/// BlazeFace detection adapter using ONNX Runtime via `ort`.
///
/// Produces a bounding box per face plus BlazeFace's six keypoints as
/// [`LandmarkLayout::BlazeFace`] landmarks. No transform matrix: orientation
/// falls back to landmark geometry.
use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;

use crate::detection::domain::detection_adapter::{DetectionAdapter, InitializationError};
use crate::detection::domain::detection_result::{
    DetectionResult, FrameDetections, LandmarkLayout, Landmarks, Point3,
};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::accelerated_execution_providers;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: 4 box + 6 keypoints × 2.
const REGRESSOR_STRIDE: usize = 16;
const NUM_KEYPOINTS: usize = 6;

/// Which backend the session ended up on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Accelerated,
    Cpu,
}

pub struct OnnxBlazefaceAdapter {
    session: Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
    backend: Backend,
}

impl OnnxBlazefaceAdapter {
    /// Builds a session on the accelerated backend, falling back to CPU.
    ///
    /// Fails only when both attempts fail; the error carries both causes.
    pub fn create(model_path: &Path, confidence: f64) -> Result<Self, InitializationError> {
        if !model_path.exists() {
            return Err(InitializationError::Model(model_path.display().to_string()));
        }

        let providers = accelerated_execution_providers();
        let accelerated = if providers.is_empty() {
            Err("no accelerator on this platform".to_string())
        } else {
            build_session(model_path, Some(providers))
        };

        let (session, backend) = match accelerated {
            Ok(session) => (session, Backend::Accelerated),
            Err(accel_err) => {
                log::warn!("Accelerated detection backend unavailable: {accel_err}");
                let session = build_session(model_path, None).map_err(|fallback| {
                    InitializationError::AllBackendsFailed {
                        accelerated: accel_err,
                        fallback,
                    }
                })?;
                (session, Backend::Cpu)
            }
        };

        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
            backend,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl DetectionAdapter for OnnxBlazefaceAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<FrameDetections, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(frame, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut raw = decode(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence as f32,
        );
        let kept = nms(&mut raw, NMS_IOU_THRESH);

        let (fw, fh) = (frame.width() as f64, frame.height() as f64);
        let detections = kept.iter().map(|d| d.to_detection(fw, fh)).collect();

        Ok(FrameDetections {
            detections,
            ..FrameDetections::default()
        })
    }
}

fn build_session(
    model_path: &Path,
    providers: Option<Vec<ExecutionProviderDispatch>>,
) -> Result<Session, String> {
    let mut builder = Session::builder().map_err(|e| e.to_string())?;
    if let Some(providers) = providers {
        builder = builder
            .with_execution_providers(providers)
            .map_err(|e| e.to_string())?;
    }
    builder.commit_from_file(model_path).map_err(|e| e.to_string())
}

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    if src_h == 0 || src_w == 0 {
        return tensor;
    }

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

/// Short-range anchors: a 16×16 grid with 2 anchors per cell and an
/// 8×8 grid with 6 per cell.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)];
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, per_cell) in &strides {
        let grid = INPUT_SIZE as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                anchors.extend(std::iter::repeat([cx, cy]).take(per_cell));
            }
        }
    }

    anchors
}

/// Candidate in normalized `0..1` coordinates.
#[derive(Clone, Debug)]
struct RawDet {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    score: f64,
    keypoints: [(f64, f64); NUM_KEYPOINTS],
}

impl RawDet {
    fn to_detection(&self, frame_w: f64, frame_h: f64) -> DetectionResult {
        let x1 = self.x1.max(0.0) * frame_w;
        let y1 = self.y1.max(0.0) * frame_h;
        let x2 = self.x2.min(1.0) * frame_w;
        let y2 = self.y2.min(1.0) * frame_h;
        let points = self
            .keypoints
            .iter()
            .map(|&(x, y)| Point3::new(x, y, 0.0))
            .collect();
        DetectionResult::new(BoundingBox::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0)))
            .with_landmarks(Landmarks::new(points, LandmarkLayout::BlazeFace))
    }
}

fn decode(reg_data: &[f32], score_data: &[f32], anchors: &[[f32; 2]], confidence: f32) -> Vec<RawDet> {
    let size = INPUT_SIZE as f32;
    let mut dets = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score);
        if score < confidence {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        let Some(reg) = reg_data.get(offset..offset + REGRESSOR_STRIDE) else {
            break;
        };
        let [ax, ay] = anchors[i];

        let cx = ax + reg[0] / size;
        let cy = ay + reg[1] / size;
        let w = reg[2] / size;
        let h = reg[3] / size;

        let mut keypoints = [(0.0, 0.0); NUM_KEYPOINTS];
        for (k, kp) in keypoints.iter_mut().enumerate() {
            let base = 4 + k * 2;
            *kp = (
                (ax + reg[base] / size) as f64,
                (ay + reg[base + 1] / size) as f64,
            );
        }

        dets.push(RawDet {
            x1: (cx - w / 2.0) as f64,
            y1: (cy - h / 2.0) as f64,
            x2: (cx + w / 2.0) as f64,
            y2: (cy + h / 2.0) as f64,
            score: score as f64,
            keypoints,
        });
    }

    dets
}

fn nms(dets: &mut [RawDet], iou_thresh: f64) -> Vec<RawDet> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawDet> = Vec::new();
    for det in dets.iter() {
        if keep.iter().all(|k| bbox_iou(k, det) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}

fn bbox_iou(a: &RawDet, b: &RawDet) -> f64 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
