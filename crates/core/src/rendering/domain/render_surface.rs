use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Straight-alpha RGBA color.
pub type Color = [u8; 4];

/// Drawing target for the live preview.
///
/// Coordinates are in surface pixels. The surface adopts the frame's
/// dimensions on every [`RenderSurface::draw_frame`].
pub trait RenderSurface {
    fn size(&self) -> (u32, u32);

    fn draw_frame(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Strokes the rectangle outline, centered on its edges.
    fn stroke_rect(
        &mut self,
        rect: &BoundingBox,
        color: Color,
        line_width: f64,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn fill_circle(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        color: Color,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Called once the tick has finished drawing. Default: no-op.
    fn present(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
