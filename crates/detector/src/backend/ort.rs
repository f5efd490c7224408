use super::{InferenceBackend, RawOutput};
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda { device_id: i32 },
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" | "gpu" => Ok(ExecutionProvider::Cuda { device_id: 0 }),
            other => anyhow::bail!("Unknown execution provider '{}'", other),
        }
    }
}

/// Graph optimization applied when the session is built. Higher levels cost
/// startup time and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    All,
}

impl OptimizationLevel {
    fn to_ort(self) -> GraphOptimizationLevel {
        match self {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Basic => GraphOptimizationLevel::Level1,
            OptimizationLevel::Extended => GraphOptimizationLevel::Level2,
            OptimizationLevel::All => GraphOptimizationLevel::Level3,
        }
    }
}

impl FromStr for OptimizationLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disable" | "none" | "0" => Ok(OptimizationLevel::Disable),
            "basic" | "1" => Ok(OptimizationLevel::Basic),
            "extended" | "2" => Ok(OptimizationLevel::Extended),
            "all" | "3" => Ok(OptimizationLevel::All),
            other => anyhow::bail!("Unknown optimization level '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub provider: ExecutionProvider,
    pub optimization: OptimizationLevel,
    pub intra_threads: usize,
    pub inter_threads: usize,
    pub input_name: String,
    pub output_name: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            provider: ExecutionProvider::Cpu,
            optimization: OptimizationLevel::Disable,
            intra_threads: 1,
            inter_threads: 1,
            input_name: "images".to_string(),
            output_name: "output0".to_string(),
        }
    }
}

pub struct OrtBackend {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OrtBackend {
    /// Load model with the given session options
    pub fn load_model_with_options(path: &str, options: &SessionOptions) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(options.optimization.to_ort())?
            .with_intra_threads(options.intra_threads)?
            .with_inter_threads(options.inter_threads)?;

        match options.provider {
            ExecutionProvider::Cuda { device_id } => {
                tracing::info!(
                    device_id,
                    "Initializing ONNX Runtime with CUDA execution provider"
                );
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(device_id)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;

        tracing::info!(
            path,
            optimization = ?options.optimization,
            "Model loaded"
        );
        Ok(Self {
            session,
            input_name: options.input_name.clone(),
            output_name: options.output_name.clone(),
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(path: &str) -> anyhow::Result<Self> {
        Self::load_model_with_options(path, &SessionOptions::default())
    }

    fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<RawOutput> {
        let outputs = self.session.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(images.view())?
        ])?;

        let output = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;
        if output.is_empty() {
            anyhow::bail!("Model returned an empty '{}' tensor", self.output_name);
        }

        RawOutput::new(output.shape().to_vec(), output.iter().copied().collect())
    }
}
