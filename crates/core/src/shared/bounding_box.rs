use serde::{Deserialize, Serialize};

/// Axis-aligned face rectangle in frame pixel coordinates.
///
/// Detectors may report boxes that extend past the frame edges; consumers
/// clamp with [`BoundingBox::pixel_span`] rather than trusting the raw values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Half-open pixel range `[x0, x1) × [y0, y1)`, already clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelSpan {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelSpan {
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Pixel span covered by the box after flooring its edges and clamping
    /// them into `[min, limit - inset]` on each axis.
    ///
    /// `min` and `inset` let callers keep a border of pixels free, e.g. for
    /// neighborhood operators that read one pixel to the right and below.
    pub fn pixel_span(&self, frame_w: u32, frame_h: u32, min: usize, inset: usize) -> PixelSpan {
        let clamp = |v: f64, limit: u32| -> usize {
            let hi = (limit as usize).saturating_sub(inset);
            if v.is_nan() || v <= min as f64 {
                min.min(hi)
            } else {
                (v.floor() as usize).clamp(min.min(hi), hi)
            }
        };
        PixelSpan {
            x0: clamp(self.x, frame_w),
            y0: clamp(self.y, frame_h),
            x1: clamp(self.x + self.width, frame_w),
            y1: clamp(self.y + self.height, frame_h),
        }
    }
}
