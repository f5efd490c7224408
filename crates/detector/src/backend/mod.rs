use ndarray::{Array, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// The inference engine boundary: takes the encoded `[1, 3, H, W]` tensor and
/// returns the raw detection head output.
pub trait InferenceBackend {
    fn load_model(path: &str) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run one forward pass. Any error means the frame has no result.
    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<RawOutput>;
}

/// Flat, row-major copy of the engine output tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutput {
    /// e.g. `[1, 84, 8400]`
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl RawOutput {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> anyhow::Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            anyhow::bail!(
                "Output shape {:?} holds {} values, got {}",
                shape,
                expected,
                data.len()
            );
        }
        Ok(Self { shape, data })
    }
}
