pub mod backend;
pub mod config;
pub mod detection;
pub mod error;
pub mod labels;
pub mod logging;
pub mod pipeline;
pub mod postprocessing;
pub mod stats;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, RawOutput};
pub use config::InferenceConfig;
pub use detection::BoundingBox;
pub use error::{DecodeError, DetectError};
pub use labels::{class_name, format_label};
pub use pipeline::Detector;
pub use postprocessing::{Decoder, TensorLayout, Yolo11Decoder, suppress};
pub use preprocess::PixelOrder;
pub use stats::FpsMeter;
