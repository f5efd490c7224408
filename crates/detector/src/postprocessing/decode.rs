use crate::detection::BoundingBox;
use crate::error::DecodeError;
use common::span_debug;
use preprocess::Letterbox;

/// Channels before the class scores: center x, center y, width, height.
pub const BOX_CHANNELS: usize = 4;

/// Shape of a `[4 + num_classes, num_elements]` detection head output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorLayout {
    pub num_classes: usize,
    pub num_elements: usize,
}

impl TensorLayout {
    /// COCO-trained YOLOv8/YOLO11 at 640x640.
    pub const YOLO11_COCO: Self = Self {
        num_classes: 80,
        num_elements: 8400,
    };

    pub fn new(num_classes: usize, num_elements: usize) -> Self {
        Self {
            num_classes,
            num_elements,
        }
    }

    pub fn channels(&self) -> usize {
        BOX_CHANNELS + self.num_classes
    }

    /// Number of `f32` values a raw buffer of this layout holds.
    pub fn expected_len(&self) -> usize {
        self.channels() * self.num_elements
    }

    /// Derive the layout from an engine output shape, `[1, C, N]` or `[C, N]`.
    pub fn from_shape(shape: &[usize]) -> Result<Self, DecodeError> {
        let (channels, elements) = match shape {
            [1, c, n] | [c, n] => (*c, *n),
            _ => return Err(DecodeError::UnsupportedShape(shape.to_vec())),
        };
        if channels <= BOX_CHANNELS {
            return Err(DecodeError::UnsupportedShape(shape.to_vec()));
        }
        Ok(Self::new(channels - BOX_CHANNELS, elements))
    }
}

impl Default for TensorLayout {
    fn default() -> Self {
        Self::YOLO11_COCO
    }
}

/// Turns one model family's raw output into image-space candidates.
///
/// Implementations threshold and map through the frame's letterbox; they do
/// not run NMS.
pub trait Decoder {
    fn decode(
        &self,
        raw: &[f32],
        letterbox: &Letterbox,
        image_size: (u32, u32),
        confidence_threshold: f32,
    ) -> Result<Vec<BoundingBox>, DecodeError>;

    fn layout(&self) -> TensorLayout;

    fn name(&self) -> &'static str;
}

/// Anchor-free head shared by YOLOv8 and YOLO11: one column per candidate,
/// rows are `cx, cy, w, h` in model-input pixels followed by per-class scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yolo11Decoder {
    layout: TensorLayout,
}

impl Yolo11Decoder {
    pub fn new(layout: TensorLayout) -> Self {
        Self { layout }
    }
}

impl Decoder for Yolo11Decoder {
    fn decode(
        &self,
        raw: &[f32],
        letterbox: &Letterbox,
        image_size: (u32, u32),
        confidence_threshold: f32,
    ) -> Result<Vec<BoundingBox>, DecodeError> {
        let _s = span_debug!("decode");

        let expected = self.layout.expected_len();
        if raw.len() != expected {
            return Err(DecodeError::BufferLength {
                expected,
                actual: raw.len(),
            });
        }

        let (image_width, image_height) = image_size;
        if image_width == 0 || image_height == 0 {
            return Err(DecodeError::InvalidImageSize {
                width: image_width,
                height: image_height,
            });
        }
        if letterbox.source != image_size {
            return Err(DecodeError::ImageSizeMismatch {
                expected: letterbox.source,
                actual: image_size,
            });
        }

        let n = self.layout.num_elements;
        let max_x = (image_width - 1) as f32;
        let max_y = (image_height - 1) as f32;

        let mut candidates = Vec::new();

        for i in 0..n {
            // First index wins on exact ties.
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 0..self.layout.num_classes {
                let score = raw[(BOX_CHANNELS + c) * n + i];
                if score > confidence {
                    confidence = score;
                    class_id = c;
                }
            }

            if confidence <= confidence_threshold {
                continue;
            }

            let (cx, cy) = letterbox.to_image_point(raw[i], raw[n + i]);
            let half_w = letterbox.to_image_length(raw[2 * n + i]) / 2.0;
            let half_h = letterbox.to_image_length(raw[3 * n + i]) / 2.0;

            candidates.push(BoundingBox {
                x_min: (cx - half_w).clamp(0.0, max_x) as i32,
                y_min: (cy - half_h).clamp(0.0, max_y) as i32,
                x_max: (cx + half_w).clamp(0.0, max_x) as i32,
                y_max: (cy + half_h).clamp(0.0, max_y) as i32,
                confidence,
                class_id,
            });
        }

        tracing::trace!(
            decoder = self.name(),
            candidates = candidates.len(),
            "Decoded raw output"
        );

        Ok(candidates)
    }

    fn layout(&self) -> TensorLayout {
        self.layout
    }

    fn name(&self) -> &'static str {
        "yolo11"
    }
}
