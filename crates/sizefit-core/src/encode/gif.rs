//! GIF encoding.
//!
//! GIF has no quality setting. The encoder palette-reduces the RGB input to
//! 256 colours with NeuQuant and writes a single frame, so every attempt at
//! any quality produces the same bytes.

use image::codecs::gif::GifEncoder;
use image::ExtendedColorType;

use super::types::{validate_rgb, EncodeError, OutputFormat};

/// NeuQuant sampling speed (1 = best palette, 30 = fastest).
const QUANTIZER_SPEED: i32 = 10;

/// Encode RGB pixel data to a single-frame GIF.
pub fn encode_gif(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(EncodeError::failed(
            OutputFormat::Gif,
            format!("{}x{} exceeds the GIF size limit of 65535", width, height),
        ));
    }

    let mut buffer = Vec::new();
    {
        // The trailer is written when the encoder is dropped.
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, QUANTIZER_SPEED);
        encoder
            .encode(pixels, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::failed(OutputFormat::Gif, e))?;
    }

    Ok(buffer)
}
