//! JPEG encoding.
//!
//! Quality maps directly onto the `image` crate's baseline JPEG quantizer
//! setting, which makes JPEG the best-behaved format for the size search:
//! output size grows monotonically with quality for practically any input.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::types::{validate_rgb, EncodeError, OutputFormat};

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality, clamped to 1-100
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(pixels, width, height)?;

    let quality = quality.clamp(1, 100);
    let mut buffer = Vec::new();

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::failed(OutputFormat::Jpeg, e))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy(width: u32, height: u32) -> Vec<u8> {
        (0..width * height * 3)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect()
    }

    #[test]
    fn test_output_is_complete_jfif_stream() {
        let bytes = encode_jpeg(&[200u8; 32 * 24 * 3], 32, 24, 75).unwrap();

        assert!(bytes.starts_with(&[0xFF, 0xD8]));
        assert!(bytes.ends_with(&[0xFF, 0xD9]));
    }

    #[test]
    fn test_size_grows_with_quality() {
        let pixels = noisy(96, 96);
        let sizes: Vec<usize> = [10u8, 50, 95]
            .iter()
            .map(|&q| encode_jpeg(&pixels, 96, 96, q).unwrap().len())
            .collect();

        assert!(sizes[0] < sizes[1]);
        assert!(sizes[1] < sizes[2]);
    }

    #[test]
    fn test_out_of_range_quality_is_clamped() {
        let pixels = [50u8; 8 * 8 * 3];
        assert_eq!(
            encode_jpeg(&pixels, 8, 8, 0).unwrap(),
            encode_jpeg(&pixels, 8, 8, 1).unwrap()
        );
        assert_eq!(
            encode_jpeg(&pixels, 8, 8, 200).unwrap(),
            encode_jpeg(&pixels, 8, 8, 100).unwrap()
        );
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert!(matches!(
            encode_jpeg(&[0u8; 10], 4, 4, 80),
            Err(EncodeError::InvalidPixelData {
                expected: 48,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_rejects_empty_raster() {
        assert!(matches!(
            encode_jpeg(&[], 0, 4, 80),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The search compares sizes across calls, so output must be reproducible.
        #[test]
        fn prop_reencode_is_byte_identical(
            width in 1u32..=16,
            height in 1u32..=16,
            quality in 1u8..=100,
            shade in any::<u8>(),
        ) {
            let pixels = vec![shade; (width * height * 3) as usize];
            prop_assert_eq!(
                encode_jpeg(&pixels, width, height, quality).unwrap(),
                encode_jpeg(&pixels, width, height, quality).unwrap()
            );
        }

        #[test]
        fn prop_any_quality_byte_encodes(quality in any::<u8>()) {
            let bytes = encode_jpeg(&[90u8; 6 * 6 * 3], 6, 6, quality);
            prop_assert!(bytes.is_ok());
        }
    }
}
