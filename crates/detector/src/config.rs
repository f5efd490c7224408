use crate::postprocessing::TensorLayout;
use common::{env_list, env_opt, env_or};

pub use common::Environment;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub environment: Environment,
    pub model_path: String,
    /// `cpu` or `cuda`
    pub execution_provider: String,
    pub cuda_device_id: i32,
    pub intra_threads: usize,
    pub graph_optimization: String,
    pub input_size: (u32, u32),
    pub layout: TensorLayout,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub image_paths: Vec<String>,
    pub otel_endpoint: Option<String>,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            environment: Environment::from_env(),
            model_path: env_opt("MODEL_PATH").unwrap_or(defaults.model_path),
            execution_provider: env_opt("EXECUTION_PROVIDER")
                .unwrap_or(defaults.execution_provider),
            cuda_device_id: env_or("CUDA_DEVICE_ID", defaults.cuda_device_id),
            intra_threads: env_or("INTRA_THREADS", defaults.intra_threads),
            graph_optimization: env_opt("GRAPH_OPTIMIZATION")
                .unwrap_or(defaults.graph_optimization),
            input_size: (
                env_or("INPUT_WIDTH", defaults.input_size.0),
                env_or("INPUT_HEIGHT", defaults.input_size.1),
            ),
            layout: TensorLayout::new(
                env_or("NUM_CLASSES", defaults.layout.num_classes),
                env_or("NUM_ELEMENTS", defaults.layout.num_elements),
            ),
            confidence_threshold: env_or("CONFIDENCE_THRESHOLD", defaults.confidence_threshold),
            iou_threshold: env_or("IOU_THRESHOLD", defaults.iou_threshold),
            image_paths: env_list("IMAGE_PATHS"),
            otel_endpoint: env_opt("OTEL_ENDPOINT"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            anyhow::bail!(
                "IOU_THRESHOLD must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            anyhow::bail!("Input size must be positive, got {:?}", self.input_size);
        }
        if self.layout.num_classes == 0 || self.layout.num_elements == 0 {
            anyhow::bail!("Tensor layout must be non-empty, got {:?}", self.layout);
        }
        if self.intra_threads == 0 {
            anyhow::bail!("INTRA_THREADS must be at least 1");
        }
        Ok(())
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            model_path: "models/yolo11n.onnx".to_string(),
            execution_provider: "cpu".to_string(),
            cuda_device_id: 0,
            intra_threads: 1,
            graph_optimization: "disable".to_string(),
            input_size: preprocess::DEFAULT_INPUT_SIZE,
            layout: TensorLayout::YOLO11_COCO,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            image_paths: Vec::new(),
            otel_endpoint: None,
        }
    }
}
