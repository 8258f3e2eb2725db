//! Scripted in-memory runtime for exercising session and block logic
//! without a real model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::runtime::{EmbedderOptions, EmbedderRuntime, ImageEmbedder};
use crate::similarity::cosine_similarity;
use crate::types::{EmbedError, EmbedResult, EmbeddingVector, RasterFrame, RunningMode};

/// Every call the runtime and its handles have received.
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    pub created: Vec<EmbedderOptions>,
    pub reconfigured: Vec<EmbedderOptions>,
    pub embedded_frames: Vec<(u32, u32)>,
    pub video_timestamps: Vec<f64>,
    pub similarity_calls: Vec<(Vec<f32>, Vec<f32>)>,
}

#[derive(Debug, Default)]
struct FakeState {
    dimension: usize,
    rejected: HashMap<String, String>,
    embed_failure: Option<String>,
    similarity: Option<f64>,
    log: CallLog,
}

/// Runtime whose handles return deterministic vectors of a fixed length.
#[derive(Debug, Clone, Default)]
pub struct FakeRuntime {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRuntime {
    pub fn new(dimension: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                dimension,
                ..FakeState::default()
            })),
        }
    }

    /// Make loading from `location` fail with `message`.
    pub fn reject_location(&self, location: &str, message: &str) {
        self.lock()
            .rejected
            .insert(location.to_string(), message.to_string());
    }

    /// Make every embed call fail with `message`.
    pub fn fail_embeds(&self, message: &str) {
        self.lock().embed_failure = Some(message.to_string());
    }

    /// Return `value` from every similarity call instead of computing it.
    pub fn set_similarity(&self, value: f64) {
        self.lock().similarity = Some(value);
    }

    /// Snapshot of the calls received so far.
    pub fn log(&self) -> CallLog {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EmbedderRuntime for FakeRuntime {
    async fn create_from_options(
        &self,
        options: &EmbedderOptions,
    ) -> EmbedResult<Box<dyn ImageEmbedder>> {
        let mut state = self.lock();
        if let Some(message) = state.rejected.get(&options.model_asset_path) {
            return Err(EmbedError::ModelLoad(message.clone()));
        }
        state.log.created.push(options.clone());
        Ok(Box::new(FakeEmbedder {
            state: Arc::clone(&self.state),
            options: options.clone(),
        }))
    }

    fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> EmbedResult<f64> {
        let mut state = self.lock();
        state.log.similarity_calls.push((a.to_vec(), b.to_vec()));
        match state.similarity {
            Some(value) => Ok(value),
            None => cosine_similarity(a, b),
        }
    }
}

struct FakeEmbedder {
    state: Arc<Mutex<FakeState>>,
    options: EmbedderOptions,
}

impl FakeEmbedder {
    fn produce(&self, frame: &RasterFrame, mode: RunningMode) -> EmbedResult<EmbeddingVector> {
        if self.options.running_mode != mode {
            return Err(EmbedError::Computation(format!(
                "Task is not initialized with {mode} mode"
            )));
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(message) = &state.embed_failure {
            return Err(EmbedError::Computation(message.clone()));
        }
        state.log.embedded_frames.push((frame.width, frame.height));
        Ok((0..state.dimension)
            .map(|i| (frame.width as usize + i) as f32 / 100.0)
            .collect())
    }
}

#[async_trait]
impl ImageEmbedder for FakeEmbedder {
    async fn set_options(&mut self, options: &EmbedderOptions) -> EmbedResult<()> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .log
            .reconfigured
            .push(options.clone());
        self.options = options.clone();
        Ok(())
    }

    async fn embed(&mut self, frame: &RasterFrame) -> EmbedResult<EmbeddingVector> {
        self.produce(frame, RunningMode::Image)
    }

    async fn embed_for_video(
        &mut self,
        frame: &RasterFrame,
        timestamp_ms: f64,
    ) -> EmbedResult<EmbeddingVector> {
        let embedding = self.produce(frame, RunningMode::Video)?;
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .log
            .video_timestamps
            .push(timestamp_ms);
        Ok(embedding)
    }
}
