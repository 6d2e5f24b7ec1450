pub const BLAZEFACE_MODEL_NAME: &str = "blaze_face_short_range.onnx";
pub const BLAZEFACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/blaze_face_short_range.onnx";

/// Minimum spacing between processed ticks (~30 fps ceiling).
pub const MIN_FRAME_INTERVAL_MS: f64 = 33.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
