//! Image Embedding blocks — entry point.

use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::{json, Value};

use image_embed::{EmbedderOptions, OnnxRuntime};
use image_embed_blocks::blocks::{BlockRegistry, ExtensionBlocks};
use image_embed_blocks::config::{resolve_locale, resolve_model_path};
use image_embed_blocks::info::{entry_info, extension_info, DEFAULT_EXTENSION_URL};
use image_embed_blocks::locale::{LocaleFormatter, MessageFormatter};
use image_embed_blocks::protocol::ProtocolHandler;
use image_embed_blocks::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "image-embed-blocks",
    about = "Image Embedding blocks — image embeddings and cosine similarity for block programs",
    version
)]
struct Cli {
    /// Model asset path or http(s) URL (ONNX).
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Locale for block text (en, ja, ja-Hira).
    #[arg(long, global = true)]
    locale: Option<String>,

    /// L2-normalize embeddings.
    #[arg(long, global = true)]
    l2_normalize: bool,

    /// ONNX intra-op threads per model session.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// URL the host loads this extension from.
    #[arg(long, global = true)]
    extension_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve block calls as JSON-RPC over stdio (default).
    Serve,

    /// Print the block palette metadata as JSON.
    Info,

    /// Print the extension-library entry as JSON.
    Entry,

    /// Run a single block and print its value.
    ///
    /// Examples:
    ///   image-embed-blocks call embedImage --image-file cat.png
    ///   image-embed-blocks call cosineSimilarity --args '{"VECTOR1":"1,0","VECTOR2":"0,1"}'
    Call {
        /// Block opcode (embedImage, embedVideoFrame, cosineSimilarity, setModelPath, getModelPath).
        opcode: String,

        /// Block arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,

        /// Image file to pass as the IMAGE argument.
        #[arg(long)]
        image_file: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let locale = resolve_locale(cli.locale.as_deref());
    if !LocaleFormatter::is_supported(&locale) {
        tracing::warn!(
            "No translations for locale {locale} (available: {}); using English text",
            LocaleFormatter::available_locales().join(", ")
        );
    }
    let formatter: Arc<dyn MessageFormatter> = Arc::new(LocaleFormatter::new(&locale));
    tracing::debug!("Block text locale: {}", formatter.locale());

    let mut runtime = OnnxRuntime::new();
    if let Some(threads) = cli.threads {
        runtime = runtime.with_intra_threads(threads);
    }
    let model_path = resolve_model_path(cli.model.as_deref());
    let extension_url = cli
        .extension_url
        .clone()
        .unwrap_or_else(|| DEFAULT_EXTENSION_URL.to_string());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Image Embedding blocks");
            tracing::info!("Model: {model_path}");
            let blocks =
                load_blocks(runtime, &model_path, cli.l2_normalize, formatter, extension_url).await?;
            let handler = ProtocolHandler::new(Arc::new(blocks));
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Info => {
            let info = extension_info(formatter.as_ref(), &extension_url, &model_path);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Entry => {
            let entry = entry_info(formatter.as_ref(), &extension_url);
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }

        Commands::Call {
            opcode,
            args,
            image_file,
        } => {
            if !BlockRegistry::OPCODES.contains(&opcode.as_str()) {
                anyhow::bail!(
                    "Unknown block {opcode} (expected one of: {})",
                    BlockRegistry::OPCODES.join(", ")
                );
            }
            let image = image_file.map(|path| file_to_data_url(&path)).transpose()?;
            let args = call_arguments(args.as_deref(), image)?;

            let blocks =
                load_blocks(runtime, &model_path, cli.l2_normalize, formatter, extension_url).await?;
            let value = BlockRegistry::call(&opcode, Some(args), &blocks).await?;
            println!("{}", serde_json::to_string(&value)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "image-embed-blocks",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

async fn load_blocks(
    runtime: OnnxRuntime,
    model_path: &str,
    l2_normalize: bool,
    formatter: Arc<dyn MessageFormatter>,
    extension_url: String,
) -> anyhow::Result<ExtensionBlocks> {
    let options = EmbedderOptions {
        l2_normalize,
        ..EmbedderOptions::new(model_path)
    };
    let mut blocks = ExtensionBlocks::load(Arc::new(runtime), options, formatter)
        .await
        .with_context(|| format!("Failed to load embedding model from {model_path}"))?;
    blocks.set_extension_url(extension_url);
    Ok(blocks)
}

/// Block arguments for `call`: the `--args` object plus an optional IMAGE.
fn call_arguments(raw: Option<&str>, image: Option<String>) -> anyhow::Result<Value> {
    let mut args: Value = match raw {
        Some(raw) => serde_json::from_str(raw).context("--args must be a JSON object")?,
        None => json!({}),
    };
    if !args.is_object() {
        anyhow::bail!("--args must be a JSON object, got {args}");
    }
    if let Some(image) = image {
        args["IMAGE"] = Value::String(image);
    }
    Ok(args)
}

fn file_to_data_url(path: &str) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
    let mime = image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    Ok(format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_arguments_default_to_empty_object() {
        assert_eq!(call_arguments(None, None).unwrap(), json!({}));
    }

    #[test]
    fn test_call_arguments_add_image() {
        let args = call_arguments(Some(r#"{"PATH":"m.onnx"}"#), Some("data:,x".into())).unwrap();
        assert_eq!(args, json!({ "PATH": "m.onnx", "IMAGE": "data:,x" }));
    }

    #[test]
    fn test_call_arguments_reject_non_object() {
        for raw in ["[1,2]", "\"text\"", "3", "null"] {
            let err = call_arguments(Some(raw), Some("data:,x".into())).unwrap_err();
            assert!(err.to_string().contains("JSON object"), "{raw}: {err}");
        }
    }

    #[test]
    fn test_call_arguments_reject_bad_json() {
        assert!(call_arguments(Some("{oops"), None).is_err());
    }
}
