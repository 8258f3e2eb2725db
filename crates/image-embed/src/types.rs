//! Core data types shared by the session, the marshaller, and embedder backends.

use serde::{Deserialize, Serialize};

/// Operating mode of an embedder handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningMode {
    #[default]
    Image,
    Video,
}

impl std::fmt::Display for RunningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunningMode::Image => write!(f, "IMAGE"),
            RunningMode::Video => write!(f, "VIDEO"),
        }
    }
}

/// A decoded RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl RasterFrame {
    /// Wrap an RGBA buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> EmbedResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(EmbedError::Decode(format!(
                "Pixel buffer holds {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Rebuild an `image` buffer for backends that preprocess with the `image` crate.
    pub fn to_image(&self) -> EmbedResult<image::DynamicImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .map(image::DynamicImage::ImageRgba8)
            .ok_or_else(|| EmbedError::Decode("Pixel buffer does not match dimensions".into()))
    }
}

impl From<image::DynamicImage> for RasterFrame {
    fn from(img: image::DynamicImage) -> Self {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }
}

/// Embedding vector produced by a model; its length is fixed by the model.
pub type EmbeddingVector = Vec<f32>;

/// Errors that can occur while embedding images.
#[derive(thiserror::Error, Debug)]
pub enum EmbedError {
    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    ModelLoad(String),

    #[error("ImageEmbedder is not initialized")]
    UninitializedSession,

    #[error("{0}")]
    Computation(String),
}

/// Convenience result type.
pub type EmbedResult<T> = Result<T, EmbedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_frame_length_checked() {
        assert!(RasterFrame::new(2, 2, vec![0; 16]).is_ok());
        let err = RasterFrame::new(2, 2, vec![0; 12]).unwrap_err();
        assert!(matches!(err, EmbedError::Decode(_)));
    }

    #[test]
    fn test_raster_frame_from_image() {
        let img = image::DynamicImage::new_rgb8(3, 2);
        let frame = RasterFrame::from(img);
        assert_eq!((frame.width, frame.height), (3, 2));
        assert_eq!(frame.data.len(), 24);
        // Alpha is filled in when converting from RGB.
        assert_eq!(frame.data[3], 255);
    }

    #[test]
    fn test_running_mode_serde() {
        assert_eq!(serde_json::to_string(&RunningMode::Video).unwrap(), "\"VIDEO\"");
        assert_eq!(RunningMode::default(), RunningMode::Image);
        assert_eq!(RunningMode::Image.to_string(), "IMAGE");
    }
}
