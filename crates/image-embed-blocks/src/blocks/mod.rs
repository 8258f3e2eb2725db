//! Block facade: the operations the host can invoke, each degrading to an
//! empty value instead of failing.

pub mod registry;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use image_embed::{
    decode_data_url, format_vector, parse_vector, EmbedError, EmbedResult, EmbedderOptions,
    EmbedderRuntime, ModelSession, RasterFrame,
};

use crate::info::{self, EntryInfo, ExtensionInfo};
use crate::locale::MessageFormatter;

pub use registry::BlockRegistry;

/// Reply of `setModelPath` when the new model loaded.
pub const MODEL_PATH_SET: &str = "Model asset path set successfully";

/// Value returned to the host by a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockValue {
    Text(String),
    Number(f64),
    /// No value; commands that did nothing.
    Undefined,
}

impl BlockValue {
    pub fn empty() -> Self {
        BlockValue::Text(String::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            BlockValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// The image-embedding blocks bound to one model session.
pub struct ExtensionBlocks {
    session: Mutex<ModelSession>,
    formatter: Arc<dyn MessageFormatter>,
    extension_url: String,
}

impl ExtensionBlocks {
    /// Load the model and return blocks ready to run.
    pub async fn load(
        runtime: Arc<dyn EmbedderRuntime>,
        options: EmbedderOptions,
        formatter: Arc<dyn MessageFormatter>,
    ) -> EmbedResult<Self> {
        let session = ModelSession::open(runtime, options).await?;
        Ok(Self::with_session(session, formatter))
    }

    /// Wrap an existing session. Its model is loaded on first use if needed.
    pub fn with_session(session: ModelSession, formatter: Arc<dyn MessageFormatter>) -> Self {
        Self {
            session: Mutex::new(session),
            formatter,
            extension_url: info::DEFAULT_EXTENSION_URL.to_string(),
        }
    }

    pub fn extension_url(&self) -> &str {
        &self.extension_url
    }

    /// Point the extension at the server it was loaded from.
    pub fn set_extension_url(&mut self, url: impl Into<String>) {
        self.extension_url = url.into();
    }

    pub fn formatter(&self) -> &dyn MessageFormatter {
        self.formatter.as_ref()
    }

    pub async fn is_ready(&self) -> bool {
        self.session.lock().await.is_ready()
    }

    /// Palette metadata for the host.
    pub async fn get_info(&self) -> ExtensionInfo {
        let model_path = self.session.lock().await.asset_location().to_string();
        info::extension_info(self.formatter(), &self.extension_url, &model_path)
    }

    /// Extension-library entry for the host.
    pub fn entry(&self) -> EntryInfo {
        info::entry_info(self.formatter(), &self.extension_url)
    }

    /// Embed the image in a data URL. Returns the comma-joined vector, or an
    /// empty string if decoding or embedding fails.
    pub async fn embed_image(&self, image: &str) -> BlockValue {
        let result = async {
            let frame = rasterize(image).await?;
            let mut session = self.session.lock().await;
            session.initialize().await?;
            let embedding = session.embed_image(&frame).await?;
            Ok::<_, EmbedError>(embedding)
        }
        .await;

        match result {
            Ok(embedding) => BlockValue::Text(format_vector(&embedding)),
            Err(e) => {
                tracing::error!("embedImage failed: {e}");
                BlockValue::empty()
            }
        }
    }

    /// Like [`Self::embed_image`], but runs the model in video mode.
    pub async fn embed_video_frame(&self, image: &str) -> BlockValue {
        let result = async {
            let frame = rasterize(image).await?;
            let mut session = self.session.lock().await;
            session.initialize().await?;
            let embedding = session.embed_video_frame(&frame).await?;
            Ok::<_, EmbedError>(embedding)
        }
        .await;

        match result {
            Ok(embedding) => BlockValue::Text(format_vector(&embedding)),
            Err(e) => {
                tracing::error!("embedVideoFrame failed: {e}");
                BlockValue::empty()
            }
        }
    }

    /// Cosine similarity of two comma-separated vectors. Empty or
    /// mismatched inputs return an empty string without consulting the model.
    pub async fn cosine_similarity(&self, vector1: &str, vector2: &str) -> BlockValue {
        let a = parse_vector(vector1);
        let b = parse_vector(vector2);
        if a.is_empty() || b.is_empty() || a.len() != b.len() {
            tracing::debug!(
                "cosineSimilarity skipped: lengths {} and {}",
                a.len(),
                b.len()
            );
            return BlockValue::empty();
        }

        match self.session.lock().await.similarity(&a, &b) {
            Ok(similarity) => BlockValue::Number(similarity),
            Err(e) => {
                tracing::error!("cosineSimilarity failed: {e}");
                BlockValue::empty()
            }
        }
    }

    /// Load the model at `path`. A blank path does nothing and returns
    /// [`BlockValue::Undefined`]; failures return the error message.
    pub async fn set_model_path(&self, path: &str) -> BlockValue {
        let path = path.trim();
        if path.is_empty() {
            return BlockValue::Undefined;
        }

        match self.session.lock().await.set_asset_location(path).await {
            Ok(()) => BlockValue::Text(MODEL_PATH_SET.to_string()),
            Err(e) => {
                tracing::error!("setModelPath failed: {e}");
                BlockValue::Text(e.to_string())
            }
        }
    }

    pub async fn get_model_path(&self) -> BlockValue {
        BlockValue::Text(self.session.lock().await.asset_location().to_string())
    }
}

async fn rasterize(image: &str) -> EmbedResult<RasterFrame> {
    let data_url = image.to_string();
    tokio::task::spawn_blocking(move || decode_data_url(&data_url))
        .await
        .map_err(|e| EmbedError::Decode(format!("Image decoding was interrupted: {e}")))?
}
