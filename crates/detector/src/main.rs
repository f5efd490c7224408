use anyhow::Context;
use common::TelemetryGuard;
use detector::{
    Detector, FpsMeter, InferenceConfig, Yolo11Decoder,
    backend::ort::{ExecutionProvider, OrtBackend, SessionOptions},
    format_label,
    logging::setup_logging,
};

fn session_options(config: &InferenceConfig) -> anyhow::Result<SessionOptions> {
    let provider = match config.execution_provider.parse()? {
        ExecutionProvider::Cuda { .. } => ExecutionProvider::Cuda {
            device_id: config.cuda_device_id,
        },
        ExecutionProvider::Cpu => ExecutionProvider::Cpu,
    };

    Ok(SessionOptions {
        provider,
        optimization: config.graph_optimization.parse()?,
        intra_threads: config.intra_threads,
        ..SessionOptions::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = InferenceConfig::from_env()?;

    let _telemetry = match config.otel_endpoint.as_deref() {
        Some(endpoint) => Some(TelemetryGuard::init(
            "detector",
            endpoint,
            config.environment,
        )?),
        None => {
            setup_logging(&config);
            None
        }
    };

    tracing::info!(config = ?config, "Loaded configuration");

    if config.image_paths.is_empty() {
        anyhow::bail!("IMAGE_PATHS is empty, nothing to detect");
    }

    let backend = OrtBackend::load_model_with_options(&config.model_path, &session_options(&config)?)
        .with_context(|| format!("Failed to load model '{}'", config.model_path))?;

    let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);
    let mut fps = FpsMeter::new();
    let mut skipped = 0usize;

    for path in &config.image_paths {
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to read image, skipping");
                skipped += 1;
                continue;
            }
        };

        let Some(detections) = detector.detect_image(&image)? else {
            skipped += 1;
            continue;
        };

        for det in &detections {
            tracing::info!(
                path = %path,
                label = %format_label(det),
                x_min = det.x_min,
                y_min = det.y_min,
                x_max = det.x_max,
                y_max = det.y_max,
                "Detection"
            );
        }

        let rate = fps.tick();
        tracing::info!(
            path = %path,
            width = image.width(),
            height = image.height(),
            detections = detections.len(),
            fps = rate,
            "Frame done"
        );
    }

    tracing::info!(
        frames = fps.total_frames(),
        skipped,
        "Finished"
    );

    Ok(())
}
