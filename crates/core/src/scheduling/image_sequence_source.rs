use std::path::{Path, PathBuf};

use crate::scheduling::frame_source::FrameSource;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Plays a list of image files as a live stream at a fixed rate.
///
/// The clock starts at the first sampled tick. Each call returns the image
/// due at that moment, so slow consumers skip images instead of falling
/// behind. Once the last image has been handed out the source reports not
/// ready.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    frame_interval_ms: f64,
    dimensions: (u32, u32),
    started_at_ms: Option<f64>,
    cached: Option<(usize, Frame)>,
    exhausted: bool,
}

impl ImageSequenceSource {
    pub fn open(paths: Vec<PathBuf>, fps: f64) -> Result<Self, Box<dyn std::error::Error>> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(format!("fps must be positive, got {fps}").into());
        }
        let first = paths.first().ok_or("image sequence is empty")?;
        let dimensions = image::image_dimensions(first)
            .map_err(|e| format!("Failed to read {}: {e}", first.display()))?;
        Ok(Self {
            paths,
            frame_interval_ms: 1000.0 / fps,
            dimensions,
            started_at_ms: None,
            cached: None,
            exhausted: false,
        })
    }

    /// Expands directories into their image files (sorted by name) and keeps
    /// explicit file paths as given.
    pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let mut paths = Vec::new();
        for input in inputs {
            if input.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_image(p))
                    .collect();
                entries.sort();
                paths.extend(entries);
            } else {
                paths.push(input.clone());
            }
        }
        Ok(paths)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Wall-clock length of the whole sequence.
    pub fn duration_ms(&self) -> f64 {
        self.paths.len() as f64 * self.frame_interval_ms
    }

    fn index_at(&self, elapsed_ms: f64) -> usize {
        // Tolerate float error at exact frame boundaries
        ((elapsed_ms / self.frame_interval_ms) + 1e-9).floor().max(0.0) as usize
    }

    fn decode(&self, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let path = &self.paths[index];
        let img = image::open(path)
            .map_err(|e| format!("Failed to decode {}: {e}", path.display()))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        Ok(Frame::new(
            img.into_raw(),
            w,
            h,
            4,
            index as f64 * self.frame_interval_ms,
        ))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn is_ready(&self) -> bool {
        !self.exhausted && !self.paths.is_empty()
    }

    fn current_frame(&mut self, now_ms: f64) -> Result<Frame, Box<dyn std::error::Error>> {
        if !self.is_ready() {
            return Err("image sequence exhausted".into());
        }
        let started = *self.started_at_ms.get_or_insert(now_ms);
        let last = self.paths.len() - 1;
        let index = self.index_at(now_ms - started).min(last);
        if index == last {
            self.exhausted = true;
        }

        if let Some((cached_index, frame)) = &self.cached {
            if *cached_index == index {
                return Ok(frame.clone());
            }
        }
        let frame = self.decode(index)?;
        self.dimensions = (frame.width(), frame.height());
        self.cached = Some((index, frame.clone()));
        Ok(frame)
    }
}
