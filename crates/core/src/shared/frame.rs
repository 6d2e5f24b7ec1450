use ndarray::ArrayView3;

/// A single sampled frame of the live stream: contiguous pixel bytes in
/// row-major order, RGBA or RGB.
///
/// Owned by the scheduler for the duration of one tick and dropped
/// afterwards; nothing in the pipeline keeps a frame across ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    timestamp_ms: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, timestamp_ms: f64) -> Self {
        debug_assert!(channels >= 3, "frames need at least three color channels");
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            timestamp_ms,
        }
    }

    /// Builds an RGBA frame filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4], timestamp_ms: f64) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(data, width, height, 4, timestamp_ms)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Presentation timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `(R, G, B)` at column `x`, row `y`. Caller guarantees bounds.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let idx = (y * self.width as usize + x) * self.channels as usize;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 16]; // 2x2x4
        let frame = Frame::new(data.clone(), 2, 2, 4, 33.0);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 4);
        assert_eq!(frame.timestamp_ms(), 33.0);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_filled_repeats_color() {
        let frame = Frame::filled(3, 2, [10, 20, 30, 255], 0.0);
        assert_eq!(frame.data().len(), 24);
        assert_eq!(frame.rgb(2, 1), (10, 20, 30));
    }

    #[test]
    fn test_rgb_skips_alpha_channel() {
        let mut data = vec![0u8; 16];
        // row=1, col=0
        data[8..12].copy_from_slice(&[1, 2, 3, 4]);
        let frame = Frame::new(data, 2, 2, 4, 0.0);
        assert_eq!(frame.rgb(0, 1), (1, 2, 3));
    }

    #[test]
    fn test_rgb_frame_indexing() {
        let mut data = vec![0u8; 12]; // 2x2x3
        data[9..12].copy_from_slice(&[7, 8, 9]); // row=1, col=1
        let frame = Frame::new(data, 2, 2, 3, 0.0);
        assert_eq!(frame.rgb(1, 1), (7, 8, 9));
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::new(Vec::new(), 0, 480, 4, 0.0);
        assert!(frame.is_empty());
        assert_eq!(frame.area(), 0.0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 4, 0.0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::new(vec![0u8; 32], 4, 2, 4, 0.0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 4]);
    }
}
