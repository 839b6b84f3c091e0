//! PNG encoding.
//!
//! PNG is lossless, so the quality knob is mapped onto the deflate
//! compression level instead: higher quality means less compression effort
//! and a larger file. Level 0 is the fastest, level 9 the smallest.

use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::types::{validate_rgb, EncodeError, OutputFormat, QualityRange};

/// Highest deflate compression level accepted by the encoder.
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

/// Map a quality value onto an inverted compression level in `[0, 9]`.
///
/// `range.min()` maps to level 9 and `range.max()` to level 0, linearly in
/// between with the fractional part truncated. Values outside the range are
/// clamped. A single-value range maps to level 0.
pub fn compression_level(quality: u8, range: QualityRange) -> u8 {
    let span = (range.max() - range.min()) as f64;
    let fraction = if span == 0.0 {
        1.0
    } else {
        (quality as f64 - range.min() as f64) / span
    };

    let steps = (fraction * MAX_COMPRESSION_LEVEL as f64).trunc() as i32;
    (MAX_COMPRESSION_LEVEL as i32 - steps).clamp(0, MAX_COMPRESSION_LEVEL as i32) as u8
}

/// Encode RGB pixel data to PNG bytes at the given deflate level.
pub fn encode_png(pixels: &[u8], width: u32, height: u32, level: u8) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    let level = level.min(MAX_COMPRESSION_LEVEL);
    let mut buffer = Vec::new();

    PngEncoder::new_with_quality(
        &mut buffer,
        CompressionType::Level(level),
        PngFilterType::Adaptive,
    )
    .write_image(pixels, width, height, ExtendedColorType::Rgb8)
    .map_err(|e| EncodeError::failed(OutputFormat::Png, e))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_compression_level_endpoints() {
        let range = QualityRange::default();
        assert_eq!(compression_level(5, range), 9);
        assert_eq!(compression_level(95, range), 0);
    }

    #[test]
    fn test_compression_level_midpoint_truncates() {
        // (50 - 5) / 90 * 9 = 4.5 -> 4 steps -> level 5
        assert_eq!(compression_level(50, QualityRange::default()), 5);
    }

    #[test]
    fn test_compression_level_clamps_outside_range() {
        let range = QualityRange::new(20, 80).unwrap();
        assert_eq!(compression_level(1, range), 9);
        assert_eq!(compression_level(100, range), 0);
    }

    #[test]
    fn test_compression_level_single_value_range() {
        let range = QualityRange::new(40, 40).unwrap();
        assert_eq!(compression_level(40, range), 0);
    }

    #[test]
    fn test_compression_level_is_non_increasing() {
        let range = QualityRange::default();
        let levels: Vec<u8> = range.iter().map(|q| compression_level(q, range)).collect();
        assert!(levels.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_encode_png_signature() {
        let png = encode_png(&vec![200u8; 16 * 16 * 3], 16, 16, 6).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_roundtrips_pixels() {
        let pixels: Vec<u8> = (0..(8 * 8 * 3)).map(|i| (i * 7 % 256) as u8).collect();
        let png = encode_png(&pixels, 8, 8, 9).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().into_rgb8();
        assert_eq!(decoded.into_raw(), pixels);
    }

    #[test]
    fn test_encode_png_invalid_pixel_data() {
        assert!(matches!(
            encode_png(&[0u8; 10], 2, 2, 6),
            Err(EncodeError::InvalidPixelData { .. })
        ));
    }
}
