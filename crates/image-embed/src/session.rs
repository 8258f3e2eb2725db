//! Model session: the single live embedder handle, its asset location, and
//! its running mode.

use std::sync::Arc;
use std::time::Instant;

use crate::runtime::{EmbedderOptions, EmbedderRuntime, ImageEmbedder};
use crate::types::{EmbedError, EmbedResult, EmbeddingVector, RasterFrame, RunningMode};

/// Owns the embedder handle and replaces it when the model asset changes.
pub struct ModelSession {
    runtime: Arc<dyn EmbedderRuntime>,
    options: EmbedderOptions,
    handle: Option<Box<dyn ImageEmbedder>>,
    started: Instant,
    last_timestamp: Option<f64>,
}

impl ModelSession {
    /// Create a session without loading the model yet.
    pub fn new(runtime: Arc<dyn EmbedderRuntime>, options: EmbedderOptions) -> Self {
        Self {
            runtime,
            options: options.with_mode(RunningMode::Image),
            handle: None,
            started: Instant::now(),
            last_timestamp: None,
        }
    }

    /// Create a session and load its model immediately.
    pub async fn open(
        runtime: Arc<dyn EmbedderRuntime>,
        options: EmbedderOptions,
    ) -> EmbedResult<Self> {
        let mut session = Self::new(runtime, options);
        session.initialize().await?;
        Ok(session)
    }

    /// Load the model if no handle exists yet.
    pub async fn initialize(&mut self) -> EmbedResult<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        let handle = self.runtime.create_from_options(&self.options).await?;
        self.handle = Some(handle);
        tracing::info!("Model session ready: {}", self.options.model_asset_path);
        Ok(())
    }

    /// Whether a handle has been created.
    pub fn is_ready(&self) -> bool {
        self.handle.is_some()
    }

    /// Current model asset location.
    pub fn asset_location(&self) -> &str {
        &self.options.model_asset_path
    }

    /// Mode the live handle is configured for.
    pub fn mode(&self) -> RunningMode {
        self.options.running_mode
    }

    /// Embed a still image, switching the handle to image mode if needed.
    pub async fn embed_image(&mut self, frame: &RasterFrame) -> EmbedResult<EmbeddingVector> {
        self.ensure_mode(RunningMode::Image).await?;
        let handle = self.handle.as_mut().ok_or(EmbedError::UninitializedSession)?;
        handle.embed(frame).await
    }

    /// Embed a video frame, switching the handle to video mode if needed.
    ///
    /// Frames are stamped with milliseconds since the session was created;
    /// stamps strictly increase even when the clock has not advanced.
    pub async fn embed_video_frame(
        &mut self,
        frame: &RasterFrame,
    ) -> EmbedResult<EmbeddingVector> {
        self.ensure_mode(RunningMode::Video).await?;
        let timestamp = self.next_timestamp();
        let handle = self.handle.as_mut().ok_or(EmbedError::UninitializedSession)?;
        handle.embed_for_video(frame, timestamp).await
    }

    /// Load a model from `location` and make it the live handle.
    ///
    /// On failure the previous handle and location stay in place.
    pub async fn set_asset_location(&mut self, location: &str) -> EmbedResult<()> {
        let options = EmbedderOptions {
            model_asset_path: location.to_string(),
            ..self.options.with_mode(RunningMode::Image)
        };
        let handle = self.runtime.create_from_options(&options).await?;

        tracing::info!(
            "Model asset changed: {} -> {}",
            self.options.model_asset_path,
            location
        );
        self.options = options;
        self.handle = Some(handle);
        self.last_timestamp = None;
        Ok(())
    }

    /// Cosine similarity computed by the runtime.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> EmbedResult<f64> {
        self.runtime.cosine_similarity(a, b)
    }

    async fn ensure_mode(&mut self, mode: RunningMode) -> EmbedResult<()> {
        let handle = self.handle.as_mut().ok_or(EmbedError::UninitializedSession)?;
        if self.options.running_mode == mode {
            return Ok(());
        }
        let options = self.options.with_mode(mode);
        handle.set_options(&options).await?;
        tracing::debug!("Switched running mode to {mode}");
        self.options = options;
        Ok(())
    }

    fn next_timestamp(&mut self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
        let timestamp = match self.last_timestamp {
            Some(last) if elapsed <= last => last + 1.0,
            _ => elapsed,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}
