use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::rendering::domain::render_surface::{Color, RenderSurface};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// In-memory RGBA canvas.
///
/// When a snapshot directory is set, every [`RenderSurface::present`]
/// writes the canvas to `overlay_NNNNN.png` there.
pub struct RgbaSurface {
    canvas: RgbaImage,
    snapshot_dir: Option<PathBuf>,
    presented: usize,
}

impl RgbaSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            snapshot_dir: None,
            presented: 0,
        }
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Number of snapshots written so far.
    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn save_png(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.canvas.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Rounds `v` to a pixel coordinate no further than `margin` outside
/// `0..limit`, so far-off geometry cannot overflow the drawing math.
fn snap(v: f64, limit: u32, margin: f64) -> i32 {
    v.round().clamp(-margin, limit as f64 + margin) as i32
}

impl RenderSurface for RgbaSurface {
    fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn draw_frame(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (w, h) = (frame.width(), frame.height());
        self.canvas = match frame.channels() {
            4 => RgbaImage::from_raw(w, h, frame.data().to_vec())
                .ok_or("frame data does not match its dimensions")?,
            3 => {
                let rgb = RgbImage::from_raw(w, h, frame.data().to_vec())
                    .ok_or("frame data does not match its dimensions")?;
                DynamicImage::ImageRgb8(rgb).to_rgba8()
            }
            n => return Err(format!("unsupported channel count: {n}").into()),
        };
        Ok(())
    }

    /// Draws concentric one-pixel outlines centered on the box edges.
    fn stroke_rect(
        &mut self,
        rect: &BoundingBox,
        color: Color,
        line_width: f64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let geometry = [rect.x, rect.y, rect.width, rect.height, line_width];
        if geometry.iter().any(|v| !v.is_finite()) {
            return Ok(());
        }
        let (w, h) = self.size();
        let reach = (line_width / 2.0).floor().max(0.0) as i32;
        let margin = reach as f64 + 2.0;

        let left = snap(rect.x, w, margin);
        let top = snap(rect.y, h, margin);
        let right = snap(rect.x + rect.width, w, margin);
        let bottom = snap(rect.y + rect.height, h, margin);

        for k in -reach..=reach {
            let (width, height) = (right - left + 2 * k, bottom - top + 2 * k);
            if width > 0 && height > 0 {
                let outline = Rect::at(left - k, top - k).of_size(width as u32, height as u32);
                draw_hollow_rect_mut(&mut self.canvas, outline, Rgba(color));
            }
        }
        Ok(())
    }

    fn fill_circle(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        color: Color,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) || radius < 0.0 {
            return Ok(());
        }
        let (w, h) = self.size();
        let margin = radius + 1.0;
        let center = (snap(cx, w, margin), snap(cy, h, margin));
        draw_filled_circle_mut(&mut self.canvas, center, radius.round() as i32, Rgba(color));
        Ok(())
    }

    fn present(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dir) = &self.snapshot_dir {
            let path = dir.join(format!("overlay_{:05}.png", self.presented));
            self.save_png(&path)?;
            self.presented += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const RED: Color = [0xef, 0x44, 0x44, 0xff];
    const GRAY: [u8; 4] = [40, 40, 40, 255];

    fn surface_with_gray(w: u32, h: u32) -> RgbaSurface {
        let mut surface = RgbaSurface::new(1, 1);
        surface
            .draw_frame(&Frame::filled(w, h, GRAY, 0.0))
            .unwrap();
        surface
    }

    #[test]
    fn test_draw_frame_adopts_frame_size() {
        let mut surface = RgbaSurface::new(1, 1);
        surface
            .draw_frame(&Frame::filled(40, 30, GRAY, 0.0))
            .unwrap();
        assert_eq!(surface.size(), (40, 30));
        assert_eq!(surface.canvas.get_pixel(39, 29).0, GRAY);
    }

    #[test]
    fn test_draw_frame_converts_rgb() {
        let data = [10u8, 20, 30].repeat(4);
        let frame = Frame::new(data, 2, 2, 3, 0.0);
        let mut surface = RgbaSurface::new(1, 1);
        surface.draw_frame(&frame).unwrap();
        assert_eq!(surface.canvas.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[rstest]
    #[case::left_edge(10, 15, true)]
    #[case::outer_half_of_line(9, 15, true)]
    #[case::top_edge(20, 10, true)]
    #[case::inner_half_of_line(11, 15, true)]
    #[case::beyond_line(8, 15, false)]
    #[case::inside_line(12, 15, false)]
    #[case::interior(20, 20, false)]
    #[case::outside(5, 15, false)]
    fn test_stroke_rect_paints_outline_only(#[case] x: u32, #[case] y: u32, #[case] painted: bool) {
        let mut surface = surface_with_gray(50, 50);
        surface
            .stroke_rect(&BoundingBox::new(10.0, 10.0, 20.0, 20.0), RED, 3.0)
            .unwrap();
        let expected = if painted { RED } else { GRAY };
        assert_eq!(surface.canvas.get_pixel(x, y).0, expected);
    }

    #[test]
    fn test_stroke_rect_clips_to_canvas() {
        let mut surface = surface_with_gray(20, 20);
        surface
            .stroke_rect(&BoundingBox::new(-5.0, -5.0, 100.0, 100.0), RED, 3.0)
            .unwrap();
        assert_eq!(surface.canvas.get_pixel(10, 10).0, GRAY);
    }

    #[test]
    fn test_far_off_geometry_is_clipped() {
        let mut surface = surface_with_gray(10, 10);
        surface
            .stroke_rect(&BoundingBox::new(1e12, -1e12, 1e13, 5.0), RED, 3.0)
            .unwrap();
        surface.fill_circle(-1e15, 1e15, 3.0, RED).unwrap();
        assert!(surface.canvas.pixels().all(|p| p.0 == GRAY));
    }

    #[test]
    fn test_fill_circle() {
        let mut surface = surface_with_gray(20, 20);
        surface.fill_circle(10.0, 10.0, 3.0, RED).unwrap();
        assert_eq!(surface.canvas.get_pixel(10, 10).0, RED);
        assert_eq!(surface.canvas.get_pixel(11, 9).0, RED);
        assert_eq!(surface.canvas.get_pixel(15, 10).0, GRAY);
    }

    #[test]
    fn test_nan_geometry_draws_nothing() {
        let mut surface = surface_with_gray(10, 10);
        surface.fill_circle(f64::NAN, 5.0, 3.0, RED).unwrap();
        surface
            .stroke_rect(&BoundingBox::new(f64::NAN, 0.0, 5.0, 5.0), RED, 3.0)
            .unwrap();
        assert!(surface.canvas.pixels().all(|p| p.0 == GRAY));
    }

    #[test]
    fn test_present_writes_numbered_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = surface_with_gray(8, 8).with_snapshot_dir(dir.path().join("overlays"));
        surface.present().unwrap();
        surface.present().unwrap();

        assert_eq!(surface.presented(), 2);
        assert!(dir.path().join("overlays/overlay_00000.png").exists());
        let reloaded = image::open(dir.path().join("overlays/overlay_00001.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(reloaded.dimensions(), (8, 8));
    }

    #[test]
    fn test_present_without_dir_is_noop() {
        let mut surface = surface_with_gray(4, 4);
        surface.present().unwrap();
        assert_eq!(surface.presented(), 0);
    }
}
