//! Lossy WebP encoding through libwebp.
//!
//! The `image` crate only ships a lossless WebP encoder, which has no
//! quality knob, so lossy output goes through the `webp` bindings.

use super::types::{validate_rgb, EncodeError, OutputFormat};

/// Encode RGB pixel data to lossy WebP bytes.
///
/// `quality` is the libwebp quality factor, clamped to 0-100.
pub fn encode_webp(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    let quality = quality.min(100) as f32;
    let memory = webp::Encoder::from_rgb(pixels, width, height)
        .encode_simple(false, quality)
        .map_err(|e| EncodeError::failed(OutputFormat::Webp, format!("{:?}", e)))?;

    Ok(memory.to_vec())
}
