//! Embedder backend running an image classification/feature model via ONNX Runtime.
//!
//! Model loading (including remote fetches) and inference block, so both run
//! on tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::runtime::{EmbedderOptions, EmbedderRuntime, ImageEmbedder};
use crate::similarity::{cosine_similarity, l2_normalize};
use crate::types::{EmbedError, EmbedResult, EmbeddingVector, RasterFrame, RunningMode};

/// Input edge length expected by MobileNet-style feature extractors.
const INPUT_SIZE: u32 = 224;
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Runtime that loads ONNX models from local paths or `http(s)` URLs.
#[derive(Debug, Default, Clone)]
pub struct OnnxRuntime {
    intra_threads: Option<usize>,
}

impl OnnxRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of intra-op threads per session.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    async fn load(&self, location: &str) -> EmbedResult<Session> {
        let runtime = self.clone();
        let location = location.to_string();
        tokio::task::spawn_blocking(move || runtime.load_session(&location))
            .await
            .map_err(|e| EmbedError::ModelLoad(format!("Model loading was interrupted: {e}")))?
    }

    fn load_session(&self, location: &str) -> EmbedResult<Session> {
        let threads = self.intra_threads.unwrap_or(1);
        let builder = Session::builder()
            .and_then(|b| b.with_intra_threads(threads))
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to prepare ONNX session: {e}")))?;

        if is_remote(location) {
            tracing::info!("Fetching embedding model from {location}");
            return builder
                .commit_from_url(location)
                .map_err(|e| EmbedError::ModelLoad(format!("Failed to load model from {location}: {e}")));
        }

        let path = Path::new(location);
        if !path.exists() {
            return Err(EmbedError::ModelLoad(format!(
                "Model asset not found at {}",
                path.display()
            )));
        }

        tracing::info!(
            "Loading embedding model from {} ({threads} intra-op threads)",
            path.display()
        );
        builder
            .commit_from_file(path)
            .map_err(|e| EmbedError::ModelLoad(format!("Failed to load ONNX model: {e}")))
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl EmbedderRuntime for OnnxRuntime {
    async fn create_from_options(
        &self,
        options: &EmbedderOptions,
    ) -> EmbedResult<Box<dyn ImageEmbedder>> {
        let session = self.load(&options.model_asset_path).await?;
        tracing::info!("Embedding model loaded ({} mode)", options.running_mode);
        Ok(Box::new(OnnxEmbedder {
            session: Arc::new(Mutex::new(session)),
            runtime: self.clone(),
            options: options.clone(),
            stream: StreamGuard::new(options.running_mode),
        }))
    }

    fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> EmbedResult<f64> {
        cosine_similarity(a, b)
    }
}

/// Running-mode and frame-ordering rules a handle enforces before inference.
#[derive(Debug, Clone, PartialEq)]
struct StreamGuard {
    mode: RunningMode,
    last_timestamp: Option<f64>,
}

impl StreamGuard {
    fn new(mode: RunningMode) -> Self {
        Self {
            mode,
            last_timestamp: None,
        }
    }

    /// Switching modes starts a new frame sequence.
    fn set_mode(&mut self, mode: RunningMode) {
        if mode != self.mode {
            self.last_timestamp = None;
        }
        self.mode = mode;
    }

    fn check_image(&self) -> EmbedResult<()> {
        self.require_mode(RunningMode::Image)
    }

    fn check_video(&self, timestamp_ms: f64) -> EmbedResult<()> {
        self.require_mode(RunningMode::Video)?;
        if let Some(last) = self.last_timestamp {
            if timestamp_ms <= last {
                return Err(EmbedError::Computation(format!(
                    "Input timestamp must be monotonically increasing ({timestamp_ms} <= {last})"
                )));
            }
        }
        Ok(())
    }

    fn record(&mut self, timestamp_ms: f64) {
        self.last_timestamp = Some(timestamp_ms);
    }

    fn require_mode(&self, mode: RunningMode) -> EmbedResult<()> {
        if self.mode != mode {
            return Err(EmbedError::Computation(format!(
                "Task is not initialized with {mode} mode. 'runningMode' must be set to '{mode}'."
            )));
        }
        Ok(())
    }
}

/// A loaded ONNX session plus the options it currently runs with.
pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    runtime: OnnxRuntime,
    options: EmbedderOptions,
    stream: StreamGuard,
}

impl OnnxEmbedder {
    async fn infer(&self, frame: &RasterFrame) -> EmbedResult<EmbeddingVector> {
        let session = Arc::clone(&self.session);
        let frame = frame.clone();
        let normalize = self.options.l2_normalize;
        tokio::task::spawn_blocking(move || run_model(&session, &frame, normalize))
            .await
            .map_err(|e| EmbedError::Computation(format!("Inference was interrupted: {e}")))?
    }
}

fn run_model(
    session: &Mutex<Session>,
    frame: &RasterFrame,
    normalize: bool,
) -> EmbedResult<EmbeddingVector> {
    let input = preprocess(frame)?;
    let input_tensor = Tensor::from_array(input)
        .map_err(|e| EmbedError::Computation(format!("Failed to create input tensor: {e}")))?;

    let mut session = session.lock().unwrap_or_else(|e| e.into_inner());
    let outputs = session
        .run(ort::inputs![input_tensor])
        .map_err(|e| EmbedError::Computation(format!("ONNX inference failed: {e}")))?;

    let (_shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| EmbedError::Computation(format!("Failed to extract output: {e}")))?;

    let embedding: Vec<f32> = data.to_vec();
    if normalize {
        Ok(l2_normalize(embedding))
    } else {
        Ok(embedding)
    }
}

#[async_trait]
impl ImageEmbedder for OnnxEmbedder {
    async fn set_options(&mut self, options: &EmbedderOptions) -> EmbedResult<()> {
        if options.model_asset_path != self.options.model_asset_path {
            let session = self.runtime.load(&options.model_asset_path).await?;
            self.session = Arc::new(Mutex::new(session));
        }
        self.stream.set_mode(options.running_mode);
        tracing::debug!("Embedder reconfigured to {} mode", options.running_mode);
        self.options = options.clone();
        Ok(())
    }

    async fn embed(&mut self, frame: &RasterFrame) -> EmbedResult<EmbeddingVector> {
        self.stream.check_image()?;
        self.infer(frame).await
    }

    async fn embed_for_video(
        &mut self,
        frame: &RasterFrame,
        timestamp_ms: f64,
    ) -> EmbedResult<EmbeddingVector> {
        self.stream.check_video(timestamp_ms)?;
        let embedding = self.infer(frame).await?;
        self.stream.record(timestamp_ms);
        Ok(embedding)
    }
}

/// Resize to the model input size and normalize into an NCHW tensor.
fn preprocess(frame: &RasterFrame) -> EmbedResult<Array4<f32>> {
    let img = frame.to_image()?;
    let resized = img.resize_exact(
        INPUT_SIZE,
        INPUT_SIZE,
        image::imageops::FilterType::Lanczos3,
    );
    let rgb = resized.to_rgb8();

    let mut tensor = Array4::<f32>::zeros((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let pixel = rgb.get_pixel(x, y);
            for c in 0..3usize {
                let val = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (val - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            }
        }
    }
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_model_is_load_error() {
        let runtime = OnnxRuntime::new();
        let opts = EmbedderOptions::new("/nonexistent/model.onnx");
        let err = runtime.create_from_options(&opts).await.err().unwrap();
        assert!(matches!(err, EmbedError::ModelLoad(_)));
        assert!(err.to_string().contains("/nonexistent/model.onnx"));
    }

    #[tokio::test]
    async fn test_garbage_model_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"not a model").unwrap();
        let opts = EmbedderOptions::new(path.to_str().unwrap());
        let runtime = OnnxRuntime::new().with_intra_threads(2);
        let err = runtime.create_from_options(&opts).await.err().unwrap();
        assert!(matches!(err, EmbedError::ModelLoad(_)));
    }

    #[test]
    fn test_intra_threads_is_kept() {
        let runtime = OnnxRuntime::new().with_intra_threads(4);
        assert_eq!(runtime.intra_threads, Some(4));
        assert_eq!(OnnxRuntime::new().intra_threads, None);
    }

    #[test]
    fn test_image_embedding_rejected_in_video_mode() {
        let guard = StreamGuard::new(RunningMode::Video);
        let err = guard.check_image().unwrap_err();
        assert!(matches!(err, EmbedError::Computation(_)));
        assert!(err.to_string().contains("IMAGE"));
    }

    #[test]
    fn test_video_embedding_rejected_in_image_mode() {
        let guard = StreamGuard::new(RunningMode::Image);
        assert!(guard.check_image().is_ok());
        assert!(guard.check_video(1.0).is_err());
    }

    #[test]
    fn test_video_timestamps_must_increase() {
        let mut guard = StreamGuard::new(RunningMode::Video);
        assert!(guard.check_video(10.0).is_ok());
        guard.record(10.0);

        assert!(guard.check_video(10.0).is_err());
        assert!(guard.check_video(9.5).is_err());
        assert!(guard.check_video(10.5).is_ok());
    }

    #[test]
    fn test_mode_switch_resets_sequence() {
        let mut guard = StreamGuard::new(RunningMode::Video);
        guard.record(500.0);

        guard.set_mode(RunningMode::Image);
        assert_eq!(guard.last_timestamp, None);
        guard.set_mode(RunningMode::Video);
        assert!(guard.check_video(1.0).is_ok());
    }

    #[test]
    fn test_same_mode_keeps_sequence() {
        let mut guard = StreamGuard::new(RunningMode::Video);
        guard.record(500.0);
        guard.set_mode(RunningMode::Video);
        assert!(guard.check_video(400.0).is_err());
    }

    #[test]
    fn test_preprocess_shape() {
        let frame = RasterFrame::from(image::DynamicImage::new_rgb8(10, 30));
        let tensor = preprocess(&frame).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        // A black pixel maps to -mean/std.
        let expected = -IMAGENET_MEAN[0] / IMAGENET_STD[0];
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://storage.example.com/model.onnx"));
        assert!(!is_remote("/models/model.onnx"));
    }
}
