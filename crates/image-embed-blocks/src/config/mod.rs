//! Configuration loading and resolution.

use std::path::PathBuf;

/// Environment variable naming the model to load at startup.
pub const MODEL_ENV: &str = "IMAGE_EMBED_MODEL";

/// Environment variable naming the locale for block text.
pub const LOCALE_ENV: &str = "IMAGE_EMBED_LOCALE";

const DEFAULT_MODEL_FILENAME: &str = "mobilenet_v3_small.onnx";

/// Resolve the model asset location: explicit value, then `IMAGE_EMBED_MODEL`,
/// then `./.image-embed/model.onnx`, then the per-user model directory.
pub fn resolve_model_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(MODEL_ENV) {
        if !env_path.trim().is_empty() {
            return env_path;
        }
    }

    let cwd_model = PathBuf::from(".image-embed/model.onnx");
    if cwd_model.exists() {
        return cwd_model.display().to_string();
    }

    resolve_default_model_path()
}

fn resolve_default_model_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.image-embed/models/{DEFAULT_MODEL_FILENAME}")
}

/// Resolve the block-text locale: explicit value, then `IMAGE_EMBED_LOCALE`, then `en`.
pub fn resolve_locale(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(LOCALE_ENV).ok())
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "en".to_string())
}
