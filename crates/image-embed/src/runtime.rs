//! Narrow interface to an external image-embedding runtime.
//!
//! Implementations can wrap an on-device model (see [`crate::onnx`]) or a
//! scripted fake for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{EmbedResult, EmbeddingVector, RasterFrame, RunningMode};

/// Options handed to the runtime when a handle is created or reconfigured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedderOptions {
    pub model_asset_path: String,
    pub running_mode: RunningMode,
    #[serde(default)]
    pub l2_normalize: bool,
}

impl EmbedderOptions {
    pub fn new(model_asset_path: impl Into<String>) -> Self {
        Self {
            model_asset_path: model_asset_path.into(),
            running_mode: RunningMode::Image,
            l2_normalize: false,
        }
    }

    /// Copy of these options with a different running mode.
    pub fn with_mode(&self, running_mode: RunningMode) -> Self {
        Self {
            running_mode,
            ..self.clone()
        }
    }
}

/// Factory side of the runtime: builds handles and compares embeddings.
#[async_trait]
pub trait EmbedderRuntime: Send + Sync {
    /// Load a model and return a handle configured with `options`.
    async fn create_from_options(
        &self,
        options: &EmbedderOptions,
    ) -> EmbedResult<Box<dyn ImageEmbedder>>;

    /// Cosine similarity between two embeddings of equal length.
    fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> EmbedResult<f64>;
}

/// A live handle to a loaded model.
#[async_trait]
pub trait ImageEmbedder: Send {
    /// Reconfigure the handle in place (used to switch running modes).
    async fn set_options(&mut self, options: &EmbedderOptions) -> EmbedResult<()>;

    /// Embed a still image. The handle must be in image mode.
    async fn embed(&mut self, frame: &RasterFrame) -> EmbedResult<EmbeddingVector>;

    /// Embed one frame of a stream. The handle must be in video mode and
    /// `timestamp_ms` must increase from call to call.
    async fn embed_for_video(
        &mut self,
        frame: &RasterFrame,
        timestamp_ms: f64,
    ) -> EmbedResult<EmbeddingVector>;
}
