use crate::shared::frame::Frame;

/// A live stream of frames, sampled on demand.
///
/// The scheduler only ever asks for the most recent frame; sources must
/// not queue frames it did not ask for.
pub trait FrameSource {
    /// Current stream dimensions. `(0, 0)` while no frame is available.
    fn dimensions(&self) -> (u32, u32);

    /// Whether a frame can be sampled right now.
    fn is_ready(&self) -> bool;

    /// Latest frame at presentation time `now_ms`.
    fn current_frame(&mut self, now_ms: f64) -> Result<Frame, Box<dyn std::error::Error>>;
}
