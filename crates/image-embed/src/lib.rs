//! Image Embedding — model session, argument marshalling, and embedder
//! backends for the image-embedding block extension.

#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod marshal;
pub mod onnx;
pub mod runtime;
pub mod session;
pub mod similarity;
pub mod types;

pub use marshal::{decode_data_url, format_vector, parse_vector};
pub use onnx::OnnxRuntime;
pub use runtime::{EmbedderOptions, EmbedderRuntime, ImageEmbedder};
pub use session::ModelSession;
pub use similarity::cosine_similarity;
pub use types::*;
