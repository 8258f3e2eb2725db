//! Conversions between block arguments (data URLs, comma-separated text) and
//! the shapes embedder backends work with.

use base64::Engine;
use image::ImageFormat;

use crate::types::{EmbedError, EmbedResult, RasterFrame};

const DATA_URL_SCHEME: &str = "data:";

/// Decode an image data URL (`data:<mime>;base64,<payload>`) into an RGBA raster.
pub fn decode_data_url(data_url: &str) -> EmbedResult<RasterFrame> {
    let rest = data_url
        .trim()
        .strip_prefix(DATA_URL_SCHEME)
        .ok_or_else(|| EmbedError::Decode("Not a data URL".to_string()))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| EmbedError::Decode("Data URL has no payload".to_string()))?;

    let mut params = header.split(';');
    let mime = params.next().unwrap_or("").trim().to_ascii_lowercase();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(EmbedError::Decode(
            "Only base64-encoded data URLs are supported".to_string(),
        ));
    }

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| EmbedError::Decode(format!("Invalid base64: {e}")))?;

    let img = match image_format_for_mime(&mime) {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt),
        None => image::load_from_memory(&bytes),
    }
    .map_err(|e| EmbedError::Decode(format!("Failed to decode image: {e}")))?;

    let frame = RasterFrame::from(img);
    tracing::debug!(
        "Decoded {} data URL into {}x{} raster",
        if mime.is_empty() { "untyped" } else { mime.as_str() },
        frame.width,
        frame.height
    );
    Ok(frame)
}

fn image_format_for_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        "image/bmp" => Some(ImageFormat::Bmp),
        _ => None,
    }
}

/// Parse comma-separated numbers. Tokens that are not numbers become `NaN`.
///
/// Blank input yields an empty vector.
pub fn parse_vector(text: &str) -> Vec<f32> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',')
        .map(|token| token.trim().parse::<f32>().unwrap_or(f32::NAN))
        .collect()
}

/// Join a vector with commas, without brackets or rounding.
pub fn format_vector(vector: &[f32]) -> String {
    vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
