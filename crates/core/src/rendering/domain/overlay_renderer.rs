use crate::detection::domain::detection_result::DetectionResult;
use crate::rendering::domain::render_surface::RenderSurface;
use crate::shared::frame::Frame;
use crate::validation::status::Verdict;

const BOX_LINE_WIDTH: f64 = 3.0;
const KEY_POINT_RADIUS: f64 = 3.0;

/// Paints the preview: the frame itself, then the face box and key points
/// in the verdict's color.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    line_width: f64,
    point_radius: f64,
}

impl OverlayRenderer {
    pub fn new(line_width: f64, point_radius: f64) -> Self {
        Self {
            line_width,
            point_radius,
        }
    }

    pub fn draw_frame(
        &self,
        surface: &mut dyn RenderSurface,
        frame: &Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        surface.draw_frame(frame)
    }

    /// Strokes the bounding box and dots the eyes, nose tip and mouth.
    ///
    /// Landmarks are normalized, so they are scaled by the surface size.
    /// Key points missing from a short landmark list are skipped.
    pub fn draw(
        &self,
        surface: &mut dyn RenderSurface,
        detection: &DetectionResult,
        verdict: Verdict,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let color = verdict.rgba();
        surface.stroke_rect(&detection.bounding_box, color, self.line_width)?;

        let Some(landmarks) = detection.landmarks.as_ref() else {
            return Ok(());
        };
        let (w, h) = surface.size();
        for point in landmarks.overlay_points() {
            surface.fill_circle(
                point.x * w as f64,
                point.y * h as f64,
                self.point_radius,
                color,
            )?;
        }
        Ok(())
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(BOX_LINE_WIDTH, KEY_POINT_RADIUS)
    }
}
