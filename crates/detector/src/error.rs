use crate::postprocessing::TensorLayout;
use preprocess::PreprocessError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Raw output length mismatch: expected {expected} values, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    #[error("Invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Unsupported output shape {0:?}")]
    UnsupportedShape(Vec<usize>),

    #[error("Output layout {actual:?} does not match decoder layout {expected:?}")]
    LayoutMismatch {
        expected: TensorLayout,
        actual: TensorLayout,
    },

    #[error("Image size {actual:?} does not match letterbox source {expected:?}")]
    ImageSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Failures of a single frame that are the caller's fault. Engine failures
/// are not errors: see [`crate::Detector::detect`].
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("Decoding failed: {0}")]
    Decode(#[from] DecodeError),
}
