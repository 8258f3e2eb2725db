//! Block and extension-entry metadata reported to the host.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::locale::{translation_map, Message, MessageFormatter};

pub const EXTENSION_ID: &str = "mpImageEmbed";

/// Where the host can fetch this extension as a module.
pub const DEFAULT_EXTENSION_URL: &str =
    "https://yokobond.github.io/xcx-mp-image-embed/dist/mpImageEmbed.mjs";

pub const HELP_LINK: &str = "https://yokobond.github.io/xcx-mp-image-embed/";

pub const COLLABORATOR: &str = "Koji Yokokawa";

const BLOCK_ICON_URI: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSI0MCIgaGVpZ2h0PSI0MCIgdmlld0JveD0iMCAwIDQwIDQwIj48cmVjdCB4PSI0IiB5PSI0IiB3aWR0aD0iMzIiIGhlaWdodD0iMzIiIHJ4PSI2IiBmaWxsPSIjNGM5N2ZmIi8+PGNpcmNsZSBjeD0iMTQiIGN5PSIxNCIgcj0iNCIgZmlsbD0iI2ZmZiIvPjxwYXRoIGQ9Ik04IDMybDktMTEgNiA3IDQtNCA3IDh6IiBmaWxsPSIjZmZmIi8+PC9zdmc+";

/// Library card image.
const ENTRY_ICON_URL: &str = "data:image/svg+xml;base64,PHN2ZyB4bWxucz0iaHR0cDovL3d3dy53My5vcmcvMjAwMC9zdmciIHdpZHRoPSI2MDAiIGhlaWdodD0iMzcyIiB2aWV3Qm94PSIwIDAgNjAwIDM3MiI+PHJlY3Qgd2lkdGg9IjYwMCIgaGVpZ2h0PSIzNzIiIGZpbGw9IiM0Yzk3ZmYiLz48cmVjdCB4PSIyMDAiIHk9Ijg2IiB3aWR0aD0iMjAwIiBoZWlnaHQ9IjIwMCIgcng9IjI0IiBmaWxsPSIjZmZmIi8+PGNpcmNsZSBjeD0iMjYwIiBjeT0iMTQ2IiByPSIyMiIgZmlsbD0iIzRjOTdmZiIvPjxwYXRoIGQ9Ik0yMjQgMjYybDU2LTcwIDM2IDQ0IDI0LTI0IDQwIDUweiIgZmlsbD0iIzRjOTdmZiIvPjwvc3ZnPg==";

/// Small icon drawn over the library card; same glyph as the block icon.
const ENTRY_INSET_ICON_URL: &str = BLOCK_ICON_URI;

pub const EXTENSION_NAME: Message = Message::new("mpImageEmbed.name", "Image Embedding");
pub const EMBED_IMAGE: Message = Message::new("mpImageEmbed.embedImage", "embeddings for [IMAGE]");
pub const EMBED_VIDEO_FRAME: Message = Message::new(
    "mpImageEmbed.embedVideoFrame",
    "embeddings for video frame [IMAGE]",
);
pub const COSINE_SIMILARITY: Message = Message::new(
    "mpImageEmbed.cosineSimilarity",
    "cosine similarity of [VECTOR1] and [VECTOR2]",
);
pub const SET_MODEL_PATH: Message =
    Message::new("mpImageEmbed.setModelPath", "set model path to [PATH]");
pub const GET_MODEL_PATH: Message = Message::new("mpImageEmbed.getModelPath", "get model path");
pub const ENTRY_NAME: Message = Message::new("mpImageEmbed.entry.name", "Image Embedding");
pub const ENTRY_DESCRIPTION: Message = Message::new(
    "mpImageEmbed.entry.description",
    "Extension to embed images using MediaPipe Image Embedder",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Reporter,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentInfo {
    #[serde(rename = "type")]
    pub arg_type: ArgumentType,
    pub default_value: String,
}

impl ArgumentInfo {
    fn string(default_value: &str) -> Self {
        Self {
            arg_type: ArgumentType::String,
            default_value: default_value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    pub opcode: String,
    pub text: String,
    pub block_type: BlockType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, ArgumentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_monitor: Option<bool>,
}

/// A palette entry: a block or a `---` separator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockItem {
    Block(BlockDefinition),
    Separator(&'static str),
}

impl BlockItem {
    pub fn opcode(&self) -> Option<&str> {
        match self {
            BlockItem::Block(def) => Some(&def.opcode),
            BlockItem::Separator(_) => None,
        }
    }
}

/// The metadata the host uses to build the block palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "extensionURL")]
    pub extension_url: String,
    #[serde(rename = "blockIconURI")]
    pub block_icon_uri: String,
    pub show_status_button: bool,
    pub blocks: Vec<BlockItem>,
    pub menus: BTreeMap<String, serde_json::Value>,
}

fn block(
    opcode: &str,
    text: String,
    block_type: BlockType,
    arguments: &[(&str, &str)],
) -> BlockDefinition {
    BlockDefinition {
        opcode: opcode.to_string(),
        text,
        block_type,
        arguments: arguments
            .iter()
            .map(|(name, default)| (name.to_string(), ArgumentInfo::string(default)))
            .collect(),
        disable_monitor: None,
    }
}

/// Build the palette metadata. `model_path` becomes the default argument of
/// the set-model-path block.
pub fn extension_info(
    formatter: &dyn MessageFormatter,
    extension_url: &str,
    model_path: &str,
) -> ExtensionInfo {
    let mut get_model_path = block(
        "getModelPath",
        formatter.format(&GET_MODEL_PATH),
        BlockType::Reporter,
        &[],
    );
    get_model_path.disable_monitor = Some(true);

    ExtensionInfo {
        id: EXTENSION_ID.to_string(),
        name: formatter.format(&EXTENSION_NAME),
        extension_url: extension_url.to_string(),
        block_icon_uri: BLOCK_ICON_URI.to_string(),
        show_status_button: false,
        blocks: vec![
            BlockItem::Block(block(
                "embedImage",
                formatter.format(&EMBED_IMAGE),
                BlockType::Reporter,
                &[("IMAGE", "data:image/png;base64,AAA")],
            )),
            BlockItem::Block(block(
                "embedVideoFrame",
                formatter.format(&EMBED_VIDEO_FRAME),
                BlockType::Reporter,
                &[("IMAGE", "data:image/png;base64,AAA")],
            )),
            BlockItem::Block(block(
                "cosineSimilarity",
                formatter.format(&COSINE_SIMILARITY),
                BlockType::Reporter,
                &[("VECTOR1", "0.1, 0.2, 0.3"), ("VECTOR2", "0.1, 0.2, 0.3")],
            )),
            BlockItem::Separator("---"),
            BlockItem::Block(block(
                "setModelPath",
                formatter.format(&SET_MODEL_PATH),
                BlockType::Command,
                &[("PATH", model_path)],
            )),
            BlockItem::Block(get_model_path),
        ],
        menus: BTreeMap::new(),
    }
}

/// Gallery entry shown by the host's extension library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub name: String,
    pub extension_id: String,
    #[serde(rename = "extensionURL")]
    pub extension_url: String,
    pub collaborator: String,
    #[serde(rename = "iconURL")]
    pub icon_url: String,
    #[serde(rename = "insetIconURL")]
    pub inset_icon_url: String,
    pub description: String,
    pub tags: Vec<String>,
    pub featured: bool,
    pub disabled: bool,
    pub bluetooth_required: bool,
    pub internet_connection_required: bool,
    pub help_link: String,
    /// `locale -> message id -> text`, so the host can localize the card.
    pub translation_map: serde_json::Value,
}

pub fn entry_info(formatter: &dyn MessageFormatter, extension_url: &str) -> EntryInfo {
    EntryInfo {
        name: formatter.format(&ENTRY_NAME),
        extension_id: EXTENSION_ID.to_string(),
        extension_url: extension_url.to_string(),
        collaborator: COLLABORATOR.to_string(),
        icon_url: ENTRY_ICON_URL.to_string(),
        inset_icon_url: ENTRY_INSET_ICON_URL.to_string(),
        description: format!(
            "{} (v{})",
            formatter.format(&ENTRY_DESCRIPTION),
            env!("CARGO_PKG_VERSION")
        ),
        tags: ["ai", "image", "machine learning", "ml", "mediapipe", "vision"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        featured: true,
        disabled: false,
        bluetooth_required: false,
        internet_connection_required: false,
        help_link: HELP_LINK.to_string(),
        translation_map: translation_map(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::{DefaultFormatter, LocaleFormatter};

    const MODEL: &str = "/models/mobilenet_v3_small.onnx";

    #[test]
    fn test_extension_info_shape() {
        let info = extension_info(&DefaultFormatter, DEFAULT_EXTENSION_URL, MODEL);
        assert_eq!(info.id, "mpImageEmbed");
        assert_eq!(info.name, "Image Embedding");
        assert!(!info.show_status_button);
        assert!(info.block_icon_uri.starts_with("data:image/svg+xml;base64,"));

        let opcodes: Vec<_> = info.blocks.iter().filter_map(BlockItem::opcode).collect();
        assert_eq!(
            opcodes,
            vec!["embedImage", "embedVideoFrame", "cosineSimilarity", "setModelPath", "getModelPath"]
        );
        assert_eq!(info.blocks[3], BlockItem::Separator("---"));
    }

    #[test]
    fn test_extension_info_json() {
        let info = extension_info(&DefaultFormatter, DEFAULT_EXTENSION_URL, MODEL);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["extensionURL"], DEFAULT_EXTENSION_URL);
        assert_eq!(json["showStatusButton"], false);
        assert_eq!(json["menus"], serde_json::json!({}));
        assert_eq!(json["blocks"][3], "---");

        let set_path = &json["blocks"][4];
        assert_eq!(set_path["opcode"], "setModelPath");
        assert_eq!(set_path["blockType"], "command");
        assert_eq!(set_path["arguments"]["PATH"]["type"], "string");
        assert_eq!(set_path["arguments"]["PATH"]["defaultValue"], MODEL);

        let get_path = &json["blocks"][5];
        assert_eq!(get_path["disableMonitor"], true);
        assert!(get_path.get("arguments").is_none());
    }

    #[test]
    fn test_extension_info_localized() {
        let info = extension_info(&LocaleFormatter::new("ja"), DEFAULT_EXTENSION_URL, MODEL);
        assert_eq!(info.name, "画像埋め込み");
        match &info.blocks[0] {
            BlockItem::Block(def) => assert_eq!(def.text, "[IMAGE] の埋め込み"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_entry_info() {
        let entry = entry_info(&DefaultFormatter, DEFAULT_EXTENSION_URL);
        assert_eq!(entry.extension_id, "mpImageEmbed");
        assert!(entry.description.starts_with("Extension to embed images"));
        assert!(entry.description.ends_with(&format!("(v{})", env!("CARGO_PKG_VERSION"))));
        assert!(entry.tags.contains(&"mediapipe".to_string()));
        assert!(entry.featured);
    }

    #[test]
    fn test_entry_info_json() {
        let entry = entry_info(&DefaultFormatter, DEFAULT_EXTENSION_URL);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["extensionId"], "mpImageEmbed");
        assert_eq!(json["extensionURL"], DEFAULT_EXTENSION_URL);
        assert!(json["iconURL"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));
        assert_eq!(json["insetIconURL"], BLOCK_ICON_URI);
        assert_eq!(json["helpLink"], HELP_LINK);
        assert_eq!(json["translationMap"]["ja"]["mpImageEmbed.entry.name"], "画像埋め込み");
    }
}
