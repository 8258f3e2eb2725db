//! Opcode dispatch from host calls to the block facade.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{BridgeError, BridgeResult};

use super::{BlockValue, ExtensionBlocks};

/// A block argument. The host may send text or numbers; both arrive as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawArgument")]
pub struct ArgText(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArgument {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<RawArgument> for ArgText {
    fn from(raw: RawArgument) -> Self {
        match raw {
            RawArgument::Text(s) => ArgText(s),
            RawArgument::Number(n) => ArgText(n.to_string()),
            RawArgument::Bool(b) => ArgText(b.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageArgs {
    #[serde(rename = "IMAGE")]
    image: ArgText,
}

#[derive(Debug, Deserialize)]
struct SimilarityArgs {
    #[serde(rename = "VECTOR1")]
    vector1: ArgText,
    #[serde(rename = "VECTOR2")]
    vector2: ArgText,
}

#[derive(Debug, Deserialize)]
struct ModelPathArgs {
    #[serde(rename = "PATH")]
    path: ArgText,
}

pub struct BlockRegistry;

impl BlockRegistry {
    /// Opcodes in palette order.
    pub const OPCODES: [&'static str; 5] = [
        "embedImage",
        "embedVideoFrame",
        "cosineSimilarity",
        "setModelPath",
        "getModelPath",
    ];

    pub async fn call(
        opcode: &str,
        arguments: Option<Value>,
        blocks: &ExtensionBlocks,
    ) -> BridgeResult<BlockValue> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));
        tracing::debug!("Calling block {opcode}");

        match opcode {
            "embedImage" => {
                let params: ImageArgs = parse(args)?;
                Ok(blocks.embed_image(&params.image.0).await)
            }
            "embedVideoFrame" => {
                let params: ImageArgs = parse(args)?;
                Ok(blocks.embed_video_frame(&params.image.0).await)
            }
            "cosineSimilarity" => {
                let params: SimilarityArgs = parse(args)?;
                Ok(blocks
                    .cosine_similarity(&params.vector1.0, &params.vector2.0)
                    .await)
            }
            "setModelPath" => {
                let params: ModelPathArgs = parse(args)?;
                Ok(blocks.set_model_path(&params.path.0).await)
            }
            "getModelPath" => Ok(blocks.get_model_path().await),
            _ => Err(BridgeError::BlockNotFound(opcode.to_string())),
        }
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> BridgeResult<T> {
    serde_json::from_value(args).map_err(|e| BridgeError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_text_accepts_numbers() {
        let args: ModelPathArgs = serde_json::from_value(serde_json::json!({ "PATH": 42 })).unwrap();
        assert_eq!(args.path, ArgText("42".into()));
    }

    #[test]
    fn test_opcodes_match_palette() {
        let info = crate::info::extension_info(
            &crate::locale::DefaultFormatter,
            crate::info::DEFAULT_EXTENSION_URL,
            "model.onnx",
        );
        let palette: Vec<_> = info.blocks.iter().filter_map(|b| b.opcode()).collect();
        assert_eq!(palette, BlockRegistry::OPCODES);
    }

    #[test]
    fn test_missing_argument_is_invalid_params() {
        let err = parse::<ImageArgs>(serde_json::json!({})).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParams(_)));
    }
}
