//! The external image decoder capability.
//!
//! The compositing engine never runs LZW itself. It wraps each frame in a
//! standalone container (see [`crate::encoder`]) and asks a [`FrameDecoder`]
//! for RGBA pixels.

use image::{ImageFormat, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("image error: {0}")]
    Image(#[from] image::error::ImageError),

    /// Decoder output matches neither the frame nor the canvas
    #[error("decoded {found_w}x{found_h}, expected {expected_w}x{expected_h}")]
    Dimensions {
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },

    #[error("generic error: {0}")]
    Generic(String),
}

impl From<String> for DecodeError {
    fn from(s: String) -> Self {
        DecodeError::Generic(s)
    }
}

/// Turns a syntactically valid single-image GIF into pixels.
///
/// Fully transparent output pixels (alpha 0) mark the frame's transparent
/// color index; the compositor leaves the canvas untouched under them.
/// The output may be sized to the logical screen, with the frame at its
/// position, or to the frame rectangle itself.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, container: &[u8]) -> Result<RgbaImage, DecodeError>;
}

/// [`FrameDecoder`] backed by the `image` crate's GIF codec
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl FrameDecoder for ImageDecoder {
    #[profiling::function]
    fn decode(&self, container: &[u8]) -> Result<RgbaImage, DecodeError> {
        let image = image::load_from_memory_with_format(container, ImageFormat::Gif)?;
        Ok(image.into_rgba8())
    }
}
