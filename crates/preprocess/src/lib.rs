pub mod config;
pub mod encoder;
pub mod error;
pub mod letterbox;

use ndarray::{Array, IxDyn};

pub use config::{DEFAULT_INPUT_SIZE, LETTERBOX_COLOR};
pub use encoder::FrameEncoder;
pub use error::PreprocessError;
pub use letterbox::Letterbox;

/// Channel order of interleaved 8-bit input pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelOrder {
    #[default]
    Rgb,
    /// OpenCV-style frames.
    Bgr,
}

/// Encoder output: the model input tensor and the geometry needed to map
/// detections back onto the source frame.
#[derive(Debug)]
pub struct EncodedFrame {
    /// `[1, 3, height, width]`, RGB, values in `[0, 1]`.
    pub tensor: Array<f32, IxDyn>,
    pub letterbox: Letterbox,
}

/// Trait for image preprocessing implementations
pub trait Preprocess {
    /// Preprocess an interleaved 8-bit frame for inference
    ///
    /// # Arguments
    /// * `pixels` - pixel data in HWC format, `width * height * 3` bytes
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `order` - Channel order of `pixels`
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        order: PixelOrder,
    ) -> Result<EncodedFrame, PreprocessError>;

    /// Get the input size this preprocessor targets
    fn input_size(&self) -> (u32, u32);
}
