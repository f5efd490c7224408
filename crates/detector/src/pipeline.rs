use crate::{
    backend::{InferenceBackend, RawOutput},
    config::InferenceConfig,
    detection::BoundingBox,
    error::{DecodeError, DetectError},
    postprocessing::{Decoder, TensorLayout, nms},
};
use image::RgbImage;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use preprocess::{FrameEncoder, PixelOrder};
use std::time::Instant;

struct PipelineMetrics {
    frame_duration: Histogram<f64>,
    frames: Counter<u64>,
    failed_frames: Counter<u64>,
    detections: Counter<u64>,
}

impl PipelineMetrics {
    fn init(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.001, 0.002, 0.005, 0.007, 0.01, 0.015, 0.02, 0.025, 0.03, 0.04, 0.05, 0.075, 0.1,
            0.15, 0.2, 0.5,
        ];

        Self {
            frame_duration: meter
                .f64_histogram("detector_frame_duration_seconds")
                .with_description("Time to process a single frame (encode + infer + decode + nms)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            frames: meter
                .u64_counter("detector_frames_total")
                .with_description("Total frames processed")
                .build(),
            failed_frames: meter
                .u64_counter("detector_frames_failed_total")
                .with_description("Frames dropped because inference failed")
                .build(),
            detections: meter
                .u64_counter("detector_detections_total")
                .with_description("Total detections produced after NMS")
                .build(),
        }
    }
}

/// Per-frame detection pipeline: letterbox encode, inference, decode, NMS.
///
/// Holds no per-frame geometry; each call computes its own letterbox and
/// hands it to the decoder, so results never depend on earlier frames.
pub struct Detector<B: InferenceBackend, D: Decoder> {
    backend: B,
    decoder: D,
    encoder: FrameEncoder,
    confidence_threshold: f32,
    iou_threshold: f32,
    metrics: PipelineMetrics,
}

impl<B: InferenceBackend, D: Decoder> Detector<B, D> {
    pub fn new(backend: B, decoder: D, config: &InferenceConfig) -> Self {
        tracing::info!(
            decoder = decoder.name(),
            layout = ?decoder.layout(),
            input_size = ?config.input_size,
            confidence_threshold = config.confidence_threshold,
            iou_threshold = config.iou_threshold,
            "Detector initialized"
        );

        Self {
            backend,
            decoder,
            encoder: FrameEncoder::new(config.input_size),
            confidence_threshold: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
            metrics: PipelineMetrics::init("detector"),
        }
    }

    /// Detect objects in one interleaved 8-bit frame.
    ///
    /// Returns `Ok(None)` when the inference engine fails; the failure is
    /// logged and the frame is skipped without post-processing. Invalid
    /// frames or a raw output that does not match the decoder layout are
    /// errors.
    pub fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        order: PixelOrder,
    ) -> Result<Option<Vec<BoundingBox>>, DetectError> {
        let span = tracing::info_span!("detect_frame", width, height);
        let _enter = span.enter();
        let start = Instant::now();

        let frame = self.encoder.encode(pixels, width, height, order)?;

        let raw = {
            let _infer_span = tracing::info_span!("model_inference").entered();
            match self.backend.infer(&frame.tensor) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(error = %e, "Inference failed, skipping frame");
                    self.metrics.failed_frames.add(1, &[]);
                    return Ok(None);
                }
            }
        };

        let detections = self.postprocess(&raw, &frame.letterbox, (width, height))?;

        self.metrics
            .frame_duration
            .record(start.elapsed().as_secs_f64(), &[]);
        self.metrics.frames.add(1, &[]);
        self.metrics.detections.add(detections.len() as u64, &[]);

        tracing::debug!(
            detections = detections.len(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Frame processed"
        );

        Ok(Some(detections))
    }

    /// Detect objects in a decoded RGB image.
    pub fn detect_image(
        &mut self,
        image: &RgbImage,
    ) -> Result<Option<Vec<BoundingBox>>, DetectError> {
        self.detect(
            image.as_raw(),
            image.width(),
            image.height(),
            PixelOrder::Rgb,
        )
    }

    fn postprocess(
        &self,
        raw: &RawOutput,
        letterbox: &preprocess::Letterbox,
        image_size: (u32, u32),
    ) -> Result<Vec<BoundingBox>, DetectError> {
        let _s = tracing::info_span!("postprocess").entered();

        let expected = self.decoder.layout();
        let actual = TensorLayout::from_shape(&raw.shape)?;
        if actual != expected {
            return Err(DecodeError::LayoutMismatch { expected, actual }.into());
        }

        let candidates = self.decoder.decode(
            &raw.data,
            letterbox,
            image_size,
            self.confidence_threshold,
        )?;
        let candidate_count = candidates.len();
        let detections = nms::suppress(candidates, self.iou_threshold);

        tracing::trace!(
            shape = ?raw.shape,
            candidates = candidate_count,
            detections = detections.len(),
            "Post-processed raw output"
        );

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocessing::{BOX_CHANNELS, Yolo11Decoder};
    use ndarray::{Array, IxDyn};

    /// Returns a fixed raw buffer, or fails, and remembers the input shape.
    struct FixedBackend {
        output: Option<RawOutput>,
        last_input_shape: Vec<usize>,
    }

    impl InferenceBackend for FixedBackend {
        fn load_model(_path: &str) -> anyhow::Result<Self> {
            anyhow::bail!("not loadable")
        }

        fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<RawOutput> {
            self.last_input_shape = images.shape().to_vec();
            self.output
                .clone()
                .ok_or_else(|| anyhow::anyhow!("engine exploded"))
        }
    }

    fn small_config() -> InferenceConfig {
        InferenceConfig {
            input_size: (64, 64),
            layout: TensorLayout::new(2, 3),
            ..InferenceConfig::default()
        }
    }

    fn raw_for(layout: TensorLayout, columns: &[([f32; 4], usize, f32)]) -> RawOutput {
        let n = layout.num_elements;
        let mut data = vec![0.0; layout.expected_len()];
        for (i, (xywh, class, score)) in columns.iter().enumerate() {
            for (row, v) in xywh.iter().enumerate() {
                data[row * n + i] = *v;
            }
            data[(BOX_CHANNELS + class) * n + i] = *score;
        }
        RawOutput::new(vec![1, layout.channels(), n], data).unwrap()
    }

    #[test]
    fn test_detect_runs_full_pipeline() {
        let config = small_config();
        let raw = raw_for(
            config.layout,
            &[
                ([32.0, 32.0, 20.0, 20.0], 0, 0.9),
                ([33.0, 32.0, 20.0, 20.0], 0, 0.8),
                ([10.0, 40.0, 8.0, 8.0], 1, 0.7),
            ],
        );
        let backend = FixedBackend {
            output: Some(raw),
            last_input_shape: Vec::new(),
        };
        let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);

        // 128x64 frame: scale 0.5, pad_y 16.
        let pixels = vec![0u8; 128 * 64 * 3];
        let detections = detector
            .detect(&pixels, 128, 64, PixelOrder::Rgb)
            .unwrap()
            .expect("inference succeeds");

        assert_eq!(detector.backend.last_input_shape, vec![1, 3, 64, 64]);
        assert_eq!(detections.len(), 2, "Near-duplicate should be suppressed");
        assert_eq!(detections[0].confidence, 0.9);
        assert_eq!(
            (
                detections[0].x_min,
                detections[0].y_min,
                detections[0].x_max,
                detections[0].y_max
            ),
            (44, 12, 84, 52)
        );
        assert_eq!(detections[1].class_id, 1);
    }

    #[test]
    fn test_detect_image_uses_rgb_buffer() {
        let config = small_config();
        let backend = FixedBackend {
            output: Some(raw_for(config.layout, &[])),
            last_input_shape: Vec::new(),
        };
        let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);

        let image = RgbImage::from_pixel(32, 16, image::Rgb([10, 20, 30]));
        let detections = detector.detect_image(&image).unwrap().unwrap();

        assert!(detections.is_empty());
        assert_eq!(detector.backend.last_input_shape, vec![1, 3, 64, 64]);
    }

    #[test]
    fn test_engine_failure_skips_frame() {
        let config = small_config();
        let backend = FixedBackend {
            output: None,
            last_input_shape: Vec::new(),
        };
        let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);

        let pixels = vec![0u8; 8 * 8 * 3];
        let result = detector.detect(&pixels, 8, 8, PixelOrder::Rgb).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_layout_mismatch_is_error() {
        let config = small_config();
        let backend = FixedBackend {
            output: Some(RawOutput::new(vec![1, 6, 2], vec![0.0; 12]).unwrap()),
            last_input_shape: Vec::new(),
        };
        let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);

        let pixels = vec![0u8; 8 * 8 * 3];
        let err = detector
            .detect(&pixels, 8, 8, PixelOrder::Rgb)
            .unwrap_err();

        assert!(matches!(
            err,
            DetectError::Decode(DecodeError::LayoutMismatch { .. })
        ));
    }

    /// Same number of values as the `[6, 3]` layout, different shape.
    #[test]
    fn test_equal_length_wrong_shape_is_error() {
        let config = small_config();
        let channel_major = raw_for(config.layout, &[([32.0, 32.0, 20.0, 20.0], 0, 0.9)]);

        for shape in [vec![1, 3, 6], vec![1, 9, 2], vec![18]] {
            let backend = FixedBackend {
                output: Some(RawOutput::new(shape.clone(), channel_major.data.clone()).unwrap()),
                last_input_shape: Vec::new(),
            };
            let mut detector =
                Detector::new(backend, Yolo11Decoder::new(config.layout), &config);

            let pixels = vec![0u8; 64 * 64 * 3];
            let err = detector
                .detect(&pixels, 64, 64, PixelOrder::Rgb)
                .unwrap_err();

            assert!(
                matches!(
                    err,
                    DetectError::Decode(
                        DecodeError::UnsupportedShape(_) | DecodeError::LayoutMismatch { .. }
                    )
                ),
                "shape {shape:?} gave {err}"
            );
        }

        // The channel-major shape itself decodes the candidate.
        let backend = FixedBackend {
            output: Some(channel_major),
            last_input_shape: Vec::new(),
        };
        let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);
        let detections = detector
            .detect(&vec![0u8; 64 * 64 * 3], 64, 64, PixelOrder::Rgb)
            .unwrap()
            .unwrap();
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn test_bad_frame_is_error() {
        let config = small_config();
        let backend = FixedBackend {
            output: None,
            last_input_shape: Vec::new(),
        };
        let mut detector = Detector::new(backend, Yolo11Decoder::new(config.layout), &config);

        let err = detector
            .detect(&[0u8; 10], 8, 8, PixelOrder::Rgb)
            .unwrap_err();

        assert!(matches!(err, DetectError::Preprocess(_)));
        assert!(
            detector.backend.last_input_shape.is_empty(),
            "Engine must not run on a rejected frame"
        );
    }
}
