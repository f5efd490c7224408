pub mod decode;
pub mod nms;

pub use decode::{BOX_CHANNELS, Decoder, TensorLayout, Yolo11Decoder};
pub use nms::suppress;
