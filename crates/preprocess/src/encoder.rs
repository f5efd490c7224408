use crate::config::{DEFAULT_INPUT_SIZE, LETTERBOX_COLOR};
use crate::error::PreprocessError;
use crate::letterbox::Letterbox;
use crate::{EncodedFrame, PixelOrder, Preprocess};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

/// Letterboxes interleaved 8-bit frames into the `[1, 3, H, W]` RGB `f32`
/// tensor the detector expects.
///
/// The padded canvas is kept between frames to avoid reallocating it.
pub struct FrameEncoder {
    pub input_size: (u32, u32),
    resizer: Resizer,
    letterboxed_buffer: Vec<u8>,
}

/// Bytes in an interleaved RGB canvas of `size`, computed in `usize`.
fn canvas_len(size: (u32, u32)) -> usize {
    size.0 as usize * size.1 as usize * 3
}

impl FrameEncoder {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            resizer: Resizer::new(),
            letterboxed_buffer: vec![LETTERBOX_COLOR; canvas_len(input_size)],
        }
    }

    pub fn encode(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        order: PixelOrder,
    ) -> Result<EncodedFrame, PreprocessError> {
        let _s = span!("encode_frame");

        tracing::trace!(
            width,
            height,
            pixel_bytes = pixels.len(),
            ?order,
            "Encoding frame"
        );

        if width == 0 || height == 0 {
            return Err(PreprocessError::InvalidDimensions { width, height });
        }

        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(PreprocessError::BufferSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let letterbox = Letterbox::compute((width, height), self.input_size)?;
        self.resize_and_letterbox(pixels, &letterbox)?;
        let tensor = self.normalize(order)?;

        Ok(EncodedFrame { tensor, letterbox })
    }

    /// Paint the gray canvas and paste the bilinear-resized source at the pad offset.
    fn resize_and_letterbox(
        &mut self,
        pixels: &[u8],
        letterbox: &Letterbox,
    ) -> Result<(), PreprocessError> {
        let _s = span!("resize_and_letterbox");

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let (new_width, new_height) = letterbox.resized;
        if new_width == 0 || new_height == 0 {
            // Degenerate aspect ratio: nothing survives the downscale.
            return Ok(());
        }

        let src = ImageRef::new(letterbox.source.0, letterbox.source.1, pixels, PixelType::U8x3)?;
        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        self.resizer.resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        let resized_data = resized.buffer();
        let row_bytes = new_width as usize * 3;
        let stride = self.input_size.0 as usize * 3;

        for y in 0..new_height as usize {
            let src_row = y * row_bytes;
            let dst_row = (y + letterbox.pad_y as usize) * stride + letterbox.pad_x as usize * 3;

            self.letterboxed_buffer[dst_row..dst_row + row_bytes]
                .copy_from_slice(&resized_data[src_row..src_row + row_bytes]);
        }

        Ok(())
    }

    /// HWC u8 -> NCHW f32 in [0, 1], always emitted in RGB order.
    fn normalize(&self, order: PixelOrder) -> Result<Array<f32, IxDyn>, PreprocessError> {
        let _s = span!("normalize");

        let width = self.input_size.0 as usize;
        let height = self.input_size.1 as usize;
        let spatial = width * height;

        let (r_idx, b_idx) = match order {
            PixelOrder::Rgb => (0, 2),
            PixelOrder::Bgr => (2, 0),
        };

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in self.letterboxed_buffer.chunks_exact(3).enumerate() {
            output[i] = px[r_idx] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[b_idx] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(IxDyn(&[1, 3, height, width]), output)?)
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

impl Preprocess for FrameEncoder {
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        order: PixelOrder,
    ) -> Result<EncodedFrame, PreprocessError> {
        self.encode(pixels, width, height, order)
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }
}
