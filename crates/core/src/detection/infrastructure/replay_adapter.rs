use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::detection::domain::detection_adapter::DetectionAdapter;
use crate::detection::domain::detection_result::FrameDetections;
use crate::shared::frame::Frame;

/// One entry of a replay file.
#[derive(Debug, Deserialize)]
struct ReplayEntry {
    frame: usize,
    #[serde(flatten)]
    detections: FrameDetections,
}

/// Replays recorded engine output instead of running inference.
///
/// Results are keyed by frame number, which is derived from the frame's
/// presentation timestamp and the stream rate. Frames without an entry
/// report no faces.
pub struct ReplayAdapter {
    recorded: HashMap<usize, FrameDetections>,
    frame_interval_ms: f64,
}

impl ReplayAdapter {
    pub fn new(recorded: HashMap<usize, FrameDetections>, fps: f64) -> Self {
        Self {
            recorded,
            frame_interval_ms: 1000.0 / fps.max(f64::MIN_POSITIVE),
        }
    }

    /// Loads a JSON array of `{"frame": n, "detections": [...], ...}`.
    pub fn from_file(path: &Path, fps: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json, fps)
    }

    pub fn from_json(json: &str, fps: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let entries: Vec<ReplayEntry> = serde_json::from_str(json)?;
        let recorded = entries
            .into_iter()
            .map(|e| (e.frame, e.detections))
            .collect();
        Ok(Self::new(recorded, fps))
    }

    fn frame_number(&self, frame: &Frame) -> usize {
        // Timestamps are multiples of the interval; absorb rounding below them
        (frame.timestamp_ms() / self.frame_interval_ms + 1e-6).floor().max(0.0) as usize
    }
}

impl DetectionAdapter for ReplayAdapter {
    fn detect(&mut self, frame: &Frame) -> Result<FrameDetections, Box<dyn std::error::Error>> {
        let n = self.frame_number(frame);
        Ok(self
            .recorded
            .get(&n)
            .cloned()
            .unwrap_or_else(FrameDetections::empty))
    }
}
